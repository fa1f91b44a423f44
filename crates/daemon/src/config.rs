//! Daemon configuration from `VANITY_*` environment variables

use std::path::PathBuf;
use std::str::FromStr;
use vanity_core::config::{
    DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_QUEUE_DEPTH, DEFAULT_MAX_SUFFIX_LEN,
    DEFAULT_MAX_TIMEOUT_MS, DEFAULT_SYNC_MAX_SUFFIX_LEN, DEFAULT_TIMEOUT_MS,
};
use vanity_core::error::{AppError, Result};
use vanity_core::EngineConfig;

const ENV_PREFIX: &str = "VANITY_";
const DEFAULT_DATA_DIR: &str = "~/.vanity-queue";
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9528;
const DEFAULT_TOOL_PATH: &str = "vanity-grind";
const DEFAULT_TOOL_ARGS: &str = "{suffix}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Fs,
    Sqlite,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fs" | "file" => Ok(StoreKind::Fs),
            "sqlite" => Ok(StoreKind::Sqlite),
            other => Err(format!("unknown store '{}' (expected fs or sqlite)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected json or pretty)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub store: StoreKind,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub tool_path: String,
    pub tool_args: String,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `key` is the name without the prefix
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, key)).filter(|value| !value.trim().is_empty())
        };

        let engine = EngineConfig {
            max_concurrent: parse_or(&get, "MAX_CONCURRENT", DEFAULT_MAX_CONCURRENT)?,
            max_queue_depth: parse_or(&get, "MAX_QUEUE_DEPTH", DEFAULT_MAX_QUEUE_DEPTH)?,
            max_suffix_len: parse_or(&get, "MAX_SUFFIX_LEN", DEFAULT_MAX_SUFFIX_LEN)?,
            sync_max_suffix_len: parse_or(&get, "SYNC_MAX_SUFFIX_LEN", DEFAULT_SYNC_MAX_SUFFIX_LEN)?,
            default_timeout_ms: parse_or(&get, "DEFAULT_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?,
            max_timeout_ms: parse_or(&get, "MAX_TIMEOUT_MS", DEFAULT_MAX_TIMEOUT_MS)?,
        };
        engine.validate()?;

        let data_dir = get("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

        Ok(Self {
            data_dir: expand(&data_dir),
            store: parse_or(&get, "STORE", StoreKind::Fs)?,
            rpc_host: get("RPC_HOST").unwrap_or_else(|| DEFAULT_RPC_HOST.to_string()),
            rpc_port: parse_or(&get, "RPC_PORT", DEFAULT_RPC_PORT)?,
            tool_path: get("TOOL_PATH").unwrap_or_else(|| DEFAULT_TOOL_PATH.to_string()),
            tool_args: get("TOOL_ARGS").unwrap_or_else(|| DEFAULT_TOOL_ARGS.to_string()),
            log_format: parse_or(&get, "LOG_FORMAT", LogFormat::Pretty)?,
            log_dir: get("LOG_DIR").map(|dir| expand(&dir)),
            engine,
        })
    }

    pub fn sqlite_url(&self) -> String {
        format!("sqlite://{}", self.data_dir.join("jobs.db").display())
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| {
            AppError::Config(format!("{}{}={:?}: {}", ENV_PREFIX, key, raw, e))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<DaemonConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DaemonConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.store, StoreKind::Fs);
        assert_eq!(config.rpc_host, "127.0.0.1");
        assert_eq!(config.rpc_port, 9528);
        assert_eq!(config.tool_path, "vanity-grind");
        assert_eq!(config.tool_args, "{suffix}");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.log_dir.is_none());
        assert_eq!(config.engine, EngineConfig::default());
        assert!(!config.data_dir.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("VANITY_DATA_DIR", "/tmp/vq"),
            ("VANITY_STORE", "sqlite"),
            ("VANITY_RPC_PORT", "9999"),
            ("VANITY_MAX_CONCURRENT", "4"),
            ("VANITY_MAX_QUEUE_DEPTH", "7"),
            ("VANITY_LOG_FORMAT", "JSON"),
            ("VANITY_TOOL_ARGS", "--suffix {suffix} --quiet"),
        ])
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/vq"));
        assert_eq!(config.store, StoreKind::Sqlite);
        assert_eq!(config.rpc_port, 9999);
        assert_eq!(config.engine.max_concurrent, 4);
        assert_eq!(config.engine.max_queue_depth, 7);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.sqlite_url(), "sqlite:///tmp/vq/jobs.db");
    }

    #[test]
    fn test_unparseable_values_are_errors() {
        let err = config(&[("VANITY_MAX_CONCURRENT", "two")]).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("VANITY_MAX_CONCURRENT")));

        let err = config(&[("VANITY_STORE", "redis")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let err = config(&[("VANITY_MAX_QUEUE_DEPTH", "0")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
