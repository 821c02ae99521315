//! Process-level plumbing shared by the server binary: layered YAML/ENV
//! configuration and `tracing` subscriber setup.

pub mod config;
pub mod logging;
mod paths;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section, ServerConfig};
pub use logging::init_logging_from_config;
