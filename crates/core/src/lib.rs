// Vanity Queue Core - Domain Logic, Ports & Scheduler
// NO infrastructure dependencies: stores and the generator tool live in infra crates

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use config::EngineConfig;
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
