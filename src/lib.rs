// wwiserip - batch ripper for Wwise audio archives
//
// This is the library crate containing the pipeline core: discovery, the
// bounded worker pool, destination mirroring, and the external-tool boundary.
// The binary crate (main.rs) provides the CLI entry point.

pub mod config;
pub mod fnv;
pub mod logging;
pub mod metrics;
pub mod mirror;
pub mod models;
pub mod naming;
pub mod pipeline;
pub mod pool;
pub mod scanner;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::ToolConfig;
pub use pipeline::{ArchiveKind, Pipeline, PipelineOptions};
pub use pool::{WorkUnit, WorkerPool};
pub use services::{ToolError, ToolKit};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
