use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use crate::models::ToolConfig;

/// Errors from a single external-tool invocation.
///
/// The tools are opaque executables, so the captured command line, exit code
/// and combined output are the only diagnostic surface there is.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("{command} exited with code {code}\n{output}")]
    NonZeroExit {
        command: String,
        code: i32,
        output: String,
    },

    #[error("{command} timed out after {limit:?}")]
    Timeout { command: String, limit: Duration },
}

/// Run one external process to completion.
///
/// Stdout and stderr are accumulated in full and the invocation succeeds only
/// on exit code zero. No retry happens at this layer; a failure aborts the
/// enclosing batch.
///
/// # Arguments
/// * `program` - Executable to spawn
/// * `args` - Arguments, passed through verbatim
/// * `cwd` - Optional working directory for the child
/// * `limit` - Optional wall-clock limit; the child is killed when it fires
pub async fn invoke(
    program: &Utf8Path,
    args: &[&str],
    cwd: Option<&Utf8Path>,
    limit: Option<Duration>,
) -> Result<(), ToolError> {
    let command_line = render_command(program, args);
    tracing::debug!("Executing: {}", command_line);

    let mut command = Command::new(program.as_std_path());
    command.args(args);
    command.kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir.as_std_path());
    }

    let start = Instant::now();

    let result = match limit {
        Some(duration) => timeout(duration, command.output())
            .await
            .map_err(|_| {
                tracing::warn!("{} timed out after {:?}", command_line, duration);
                ToolError::Timeout {
                    command: command_line.clone(),
                    limit: duration,
                }
            })?,
        None => command.output().await,
    };

    let output = result.map_err(|source| ToolError::Spawn {
        command: command_line.clone(),
        source,
    })?;

    let code = output.status.code().unwrap_or(-1);
    tracing::debug!(
        "{} finished in {:.2}s with exit code {}",
        program,
        start.elapsed().as_secs_f32(),
        code
    );

    if output.status.success() {
        Ok(())
    } else {
        Err(ToolError::NonZeroExit {
            command: command_line,
            code,
            output: combined_output(&output),
        })
    }
}

fn render_command(program: &Utf8Path, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{}\n{}", stdout.trim_end(), stderr.trim_end())
}

/// The external tool bundle, with paths resolved from [`ToolConfig`].
///
/// Each method fixes one tool's argument convention; everything else about
/// the tools is opaque. Methods spawn a fresh process per call - there is no
/// handle reuse.
#[derive(Debug, Clone)]
pub struct ToolKit {
    quickbms: Utf8PathBuf,
    pck_script: Utf8PathBuf,
    vgmstream: Utf8PathBuf,
    bnkextr: Utf8PathBuf,
    batch_script: Utf8PathBuf,
    staging_input_dir: Utf8PathBuf,
    staging_output_dir: Utf8PathBuf,
    timeout: Option<Duration>,
}

impl ToolKit {
    pub fn from_config(config: &ToolConfig) -> Self {
        let tools_dir = Utf8Path::new(&config.tools_dir);
        Self {
            quickbms: resolve(tools_dir, &config.quickbms),
            pck_script: resolve(tools_dir, &config.pck_script),
            vgmstream: resolve(tools_dir, &config.vgmstream),
            bnkextr: resolve(tools_dir, &config.bnkextr),
            batch_script: Utf8PathBuf::from(config.batch_script.as_str()),
            staging_input_dir: Utf8PathBuf::from(config.staging_input_dir.as_str()),
            staging_output_dir: Utf8PathBuf::from(config.staging_output_dir.as_str()),
            timeout: config.tool_timeout(),
        }
    }

    /// Tool-owned input folder consumed by the batch script.
    pub fn staging_input_dir(&self) -> &Utf8Path {
        &self.staging_input_dir
    }

    /// Tool-owned output folder produced by the batch script.
    pub fn staging_output_dir(&self) -> &Utf8Path {
        &self.staging_output_dir
    }

    /// Unpack one `.pck` archive into `out_dir`. The output directory must
    /// already exist.
    pub async fn unpack_pck(&self, archive: &Utf8Path, out_dir: &Utf8Path) -> Result<(), ToolError> {
        invoke(
            &self.quickbms,
            &[
                "-q",
                "-k",
                self.pck_script.as_str(),
                archive.as_str(),
                out_dir.as_str(),
            ],
            None,
            self.timeout,
        )
        .await
    }

    /// Extract one `.bnk` bank into `out_dir`. The extractor emits
    /// `.wav`-named raw streams; the pipeline renames them afterwards.
    pub async fn extract_bnk(&self, bank: &Utf8Path, out_dir: &Utf8Path) -> Result<(), ToolError> {
        invoke(
            &self.bnkextr,
            &[bank.as_str(), out_dir.as_str()],
            None,
            self.timeout,
        )
        .await
    }

    /// Convert one raw `.wem` stream into `dest`. The converter does not
    /// tolerate parallel invocation; callers serialize this through a
    /// single-worker pool.
    pub async fn convert_wem(&self, source: &Utf8Path, dest: &Utf8Path) -> Result<(), ToolError> {
        invoke(
            &self.vgmstream,
            &["-o", dest.as_str(), source.as_str()],
            None,
            self.timeout,
        )
        .await
    }

    /// Run the bundle's monolithic batch script once over its staged input
    /// folder, from the script's own directory.
    pub async fn run_batch_script(&self) -> Result<(), ToolError> {
        invoke(
            &self.batch_script,
            &[],
            self.batch_script.parent(),
            self.timeout,
        )
        .await
    }
}

fn resolve(tools_dir: &Utf8Path, entry: &str) -> Utf8PathBuf {
    let path = Utf8Path::new(entry);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        tools_dir.join(path)
    }
}
