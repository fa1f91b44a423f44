//! Vanity CLI - Command-line client for the Vanity Queue daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9528";

#[derive(Parser)]
#[command(name = "vanity")]
#[command(about = "Vanity Queue CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "VANITY_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Print raw JSON results
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue a vanity keypair search
    Submit {
        /// Required public key suffix (base58, no 0/O/I/l)
        suffix: String,

        /// Number of keypairs (1-10)
        #[arg(short, long)]
        count: Option<i64>,

        /// Per-keypair timeout in milliseconds
        #[arg(short, long)]
        timeout_ms: Option<i64>,
    },

    /// Show a job, including generated keys
    Status {
        /// Job ID
        id: String,
    },

    /// List all jobs
    List,

    /// Generate keypairs inline (short suffixes only)
    Generate {
        suffix: String,

        #[arg(short, long)]
        count: Option<i64>,

        #[arg(short, long)]
        timeout_ms: Option<i64>,
    },

    /// Show scheduler health
    Health,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct SubmitResult {
    id: String,
    status: String,
    #[tabled(display_with = "display_position")]
    queue_position: Option<usize>,
}

#[derive(Deserialize)]
struct Progress {
    completed: u32,
    total: u32,
}

#[derive(Deserialize)]
struct JobRow {
    id: String,
    suffix: String,
    status: String,
    progress: Progress,
    queue_position: Option<usize>,
    created_at: i64,
}

#[derive(Tabled)]
struct JobTableRow {
    id: String,
    suffix: String,
    status: String,
    progress: String,
    position: String,
    created: String,
}

#[derive(Deserialize, Tabled)]
struct KeypairRow {
    public_key: String,
    secret_key: String,
    elapsed_ms: u64,
}

fn display_position(position: &Option<usize>) -> String {
    position.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string())
}

fn colored_status(status: &str) -> String {
    match status {
        "complete" => status.green().to_string(),
        "failed" => status.red().to_string(),
        "running" => status.cyan().to_string(),
        _ => status.yellow().to_string(),
    }
}

fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn keypair_params(suffix: String, count: Option<i64>, timeout_ms: Option<i64>) -> serde_json::Value {
    let mut params = json!({ "suffix": suffix });
    if let Some(count) = count {
        params["count"] = json!(count);
    }
    if let Some(timeout_ms) = timeout_ms {
        params["timeout_ms"] = json!(timeout_ms);
    }
    params
}

fn print_keypairs(keypairs: serde_json::Value) -> Result<()> {
    let rows: Vec<KeypairRow> = serde_json::from_value(keypairs)?;
    if rows.is_empty() {
        println!("{}", "No keypairs yet".yellow());
    } else {
        println!("{}", Table::new(rows));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit {
            suffix,
            count,
            timeout_ms,
        } => {
            let params = keypair_params(suffix, count, timeout_ms);
            let result = call_rpc(&cli.rpc_url, "vanity.submit.v1", params).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            let submitted: SubmitResult = serde_json::from_value(result)?;
            println!("{}", "✓ Job submitted".green().bold());
            println!();
            println!("{}", Table::new(vec![submitted]));
        }

        Commands::Status { id } => {
            let job = call_rpc(&cli.rpc_url, "vanity.get.v1", json!({ "id": id })).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&job)?);
                return Ok(());
            }

            let status = job["status"].as_str().unwrap_or("unknown");
            println!("{} {}", "Job".cyan().bold(), id);
            println!("  {} {}", "Suffix:".bold(), job["suffix"].as_str().unwrap_or(""));
            println!("  {} {}", "Status:".bold(), colored_status(status));
            println!(
                "  {} {}/{}",
                "Progress:".bold(),
                job["progress"]["completed"],
                job["progress"]["total"]
            );
            if let Some(position) = job["queue_position"].as_u64() {
                println!("  {} {}", "Queue position:".bold(), position);
            }
            if let Some(error) = job["error"].as_str() {
                println!("  {} {}", "Error:".bold(), error.red());
            }
            println!();
            print_keypairs(job["results"].clone())?;
        }

        Commands::List => {
            let result = call_rpc(&cli.rpc_url, "vanity.list.v1", json!({})).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            let jobs: Vec<JobRow> = serde_json::from_value(result)?;
            if jobs.is_empty() {
                println!("{}", "No jobs".yellow());
                return Ok(());
            }
            let rows: Vec<JobTableRow> = jobs
                .into_iter()
                .map(|job| JobTableRow {
                    id: job.id,
                    suffix: job.suffix,
                    status: colored_status(&job.status),
                    progress: format!("{}/{}", job.progress.completed, job.progress.total),
                    position: display_position(&job.queue_position),
                    created: format_millis(job.created_at),
                })
                .collect();
            println!("{}", Table::new(rows));
        }

        Commands::Generate {
            suffix,
            count,
            timeout_ms,
        } => {
            println!("{}", "Generating (this holds until the search finishes)...".cyan());
            let params = keypair_params(suffix, count, timeout_ms);
            let result = call_rpc(&cli.rpc_url, "vanity.generate.v1", params).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }
            print_keypairs(result["keypairs"].clone())?;
        }

        Commands::Health => {
            println!("{}", "Scheduler Health".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.health.v1", json!({})).await {
                Ok(health) => {
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&health)?);
                        return Ok(());
                    }
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {}", "Version:".bold(), health["version"]);
                    println!();
                    println!(
                        "  {} {}/{}",
                        "Running:".bold(),
                        health["running"],
                        health["max_concurrent"]
                    );
                    println!(
                        "  {} {}/{}",
                        "Queued:".bold(),
                        health["queued"],
                        health["max_queue_depth"]
                    );
                    println!("  {} {} seconds", "Uptime:".bold(), health["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
