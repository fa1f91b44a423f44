// External tool keypair generator
// reason: tokio::process so a long search never blocks a runtime thread
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::keypair::verify_keypair;
use crate::output::parse_tool_output;
use vanity_core::domain::GeneratedKeypair;
use vanity_core::port::{GenerationError, KeypairGenerator};

/// Placeholder replaced by the requested suffix in every argument
pub const SUFFIX_PLACEHOLDER: &str = "{suffix}";

/// Runs the vanity-search binary once per requested keypair
pub struct ToolGenerator {
    program: PathBuf,
    arg_template: Vec<String>,
}

impl ToolGenerator {
    /// Create a new tool generator
    ///
    /// # Arguments
    /// * `program` - Path (or name on `PATH`) of the search binary
    /// * `arg_template` - Arguments, with `{suffix}` substituted per call
    ///
    /// # Example
    /// ```ignore
    /// let generator = ToolGenerator::new("vanity-grind", vec!["--suffix".into(), "{suffix}".into()]);
    /// ```
    pub fn new(program: impl Into<PathBuf>, arg_template: Vec<String>) -> Self {
        Self {
            program: program.into(),
            arg_template,
        }
    }

    /// Template split on whitespace, e.g. `"--ends-with {suffix} --quiet"`
    pub fn from_template(program: impl Into<PathBuf>, template: &str) -> Self {
        Self::new(
            program,
            template.split_whitespace().map(str::to_string).collect(),
        )
    }

    fn args_for(&self, suffix: &str) -> Vec<String> {
        self.arg_template
            .iter()
            .map(|arg| arg.replace(SUFFIX_PLACEHOLDER, suffix))
            .collect()
    }

    /// Spawn the tool and collect stdout followed by stderr
    async fn run_tool(&self, suffix: &str, timeout_ms: u64) -> Result<String, GenerationError> {
        let args = self.args_for(suffix);
        debug!(program = %self.program.display(), args = ?args, "Spawning generator");

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                GenerationError::SpawnFailed(format!("{}: {}", self.program.display(), e))
            })?;

        // Dropping the wait future on timeout drops the child, which kills it
        let output = match timeout(Duration::from_millis(timeout_ms), child.wait_with_output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(GenerationError::Io(e.to_string())),
            Err(_) => {
                warn!(suffix = %suffix, timeout_ms = timeout_ms, "Generator timed out, killed");
                return Err(GenerationError::Timeout(timeout_ms));
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(GenerationError::ToolFailure {
                exit_code: output.status.code(),
                output: text.trim().to_string(),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl KeypairGenerator for ToolGenerator {
    async fn generate_one(
        &self,
        suffix: &str,
        timeout_ms: u64,
    ) -> Result<GeneratedKeypair, GenerationError> {
        let started = Instant::now();

        let text = self.run_tool(suffix, timeout_ms).await?;
        let parsed = parse_tool_output(&text)?;
        let verified = verify_keypair(&parsed.address, &parsed.secret)?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            public_key = %verified.public_key,
            elapsed_ms = elapsed_ms,
            tool_elapsed_seconds = ?parsed.elapsed_seconds,
            "Generator produced verified keypair"
        );

        Ok(GeneratedKeypair {
            public_key: verified.public_key,
            secret_key: verified.secret_key,
            elapsed_ms,
            tool_elapsed_seconds: parsed.elapsed_seconds,
        })
    }
}
