//! Data models for the ripping pipeline.
//!
//! Currently just [`ToolConfig`], the serde structure persisted as
//! `wwiserip.yaml` by [`ConfigManager`](crate::config::ConfigManager).

pub mod config;

pub use config::ToolConfig;
