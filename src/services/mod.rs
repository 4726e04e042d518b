//! Services module - external tool invocation.
//!
//! The extraction and conversion tools are opaque executables invoked with
//! fixed argument conventions. This module owns that boundary:
//!
//! - [`invoke`]: one subprocess run - full stdout/stderr capture, success iff
//!   exit code zero, optional wall-clock limit
//! - [`ToolKit`]: the configured tool bundle (QuickBMS + extraction script,
//!   vgmstream-cli, bnkextr, the staged batch script) with one method per
//!   tool fixing its argument convention
//! - [`ToolError`]: the failure surface - command line, exit code and
//!   captured output, since the tools offer no other diagnostics
//!
//! No retry and no output parsing happen here; the pipeline coordinator
//! decides what a failure means for the batch.

pub mod tools;

pub use tools::{ToolError, ToolKit, invoke};
