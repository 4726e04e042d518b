//! wwiserip - batch ripper for Wwise audio archives.
//!
//! Main entry point for the command-line frontend. It initializes:
//! - Logging infrastructure (daily file rotation + console output)
//! - Tokio async runtime (subprocess execution, concurrent file I/O)
//! - Tool configuration (`wwiserip.yaml`, written with defaults on first run)
//! - The pipeline coordinator for the requested archive kind
//!
//! # Execution Flow
//!
//! 1. Parse CLI arguments (archive kind, source, destination roots)
//! 2. Initialize logging -> logs/wwiserip.<date>
//! 3. Build the tokio runtime explicitly and block on the pipeline
//! 4. Pre-flight: refuse destination roots that already hold `wem`/`wav`
//! 5. Run scan -> unpack -> rescan -> mirror -> convert
//! 6. Log the run summary; exit nonzero on the first failure
//!
//! Progress percentages and found-file counts are the only positive
//! feedback; everything else lands in the log file.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use wwiserip::metrics::Metrics;
use wwiserip::pipeline::{self, FINAL_DIR_NAME, RAW_DIR_NAME};
use wwiserip::{APP_NAME, ArchiveKind, ConfigManager, Pipeline, PipelineOptions, ToolKit, VERSION};

#[derive(Parser)]
#[command(name = "wwiserip", version, about = "Rip Wwise audio archives to wav")]
struct Cli {
    /// Directory holding wwiserip.yaml (created on first run)
    #[arg(long, default_value = "config")]
    config: Utf8PathBuf,

    /// Enable debug-level logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rip .pck soundbank archives
    Pck {
        /// Source tree to search for archives
        source: Utf8PathBuf,

        /// Destination root; receives wem/ and wav/ subtrees unless FINAL_DEST is given
        dest: Utf8PathBuf,

        /// Explicit final-output root; DEST then holds the raw tree directly
        final_dest: Option<Utf8PathBuf>,

        /// Unpack-stage worker count (default: twice the logical CPU count)
        #[arg(long)]
        jobs: Option<usize>,

        /// Stage archives into the tool bundle's input folder and run its
        /// batch script once instead of unpacking per archive
        #[arg(long)]
        staged: bool,
    },

    /// Rip .bnk bank files
    Bnk {
        /// Source tree to search for banks
        source: Utf8PathBuf,

        /// Destination root; receives wem/ and wav/ subtrees unless FINAL_DEST is given
        dest: Utf8PathBuf,

        /// Explicit final-output root; DEST then holds the raw tree directly
        final_dest: Option<Utf8PathBuf>,

        /// Unpack-stage worker count (default: twice the logical CPU count)
        #[arg(long)]
        jobs: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console output carries the user-visible progress feedback.
    let _guard = wwiserip::logging::setup_logging("logs", "wwiserip", cli.debug, true)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("wwiserip-worker")
        .build()
        .context("Failed to build tokio runtime")?;

    let result = runtime.block_on(run(cli));

    if let Err(ref err) = result {
        tracing::error!("{:#}", err);
    }

    result
}

async fn run(cli: Cli) -> Result<()> {
    let config_manager = ConfigManager::new(&cli.config)?;
    let tool_config = config_manager.load_tool_config()?;
    let tools = Arc::new(ToolKit::from_config(&tool_config));
    let metrics = Arc::new(Metrics::new());

    match cli.command {
        Command::Pck {
            source,
            dest,
            final_dest,
            jobs,
            staged,
        } => {
            let (raw_root, final_root) = resolve_roots(&dest, final_dest.as_deref()).await?;
            let options = PipelineOptions {
                unpack_concurrency: jobs,
                staged,
            };
            Pipeline::new(tools, Arc::clone(&metrics), options)
                .run(ArchiveKind::Pck, &source, &raw_root, &final_root)
                .await?;
        }
        Command::Bnk {
            source,
            dest,
            final_dest,
            jobs,
        } => {
            let (raw_root, final_root) = resolve_roots(&dest, final_dest.as_deref()).await?;
            let options = PipelineOptions {
                unpack_concurrency: jobs,
                staged: false,
            };
            Pipeline::new(tools, Arc::clone(&metrics), options)
                .run(ArchiveKind::Bnk, &source, &raw_root, &final_root)
                .await?;
        }
    }

    metrics.log_summary();
    Ok(())
}

/// One destination argument means a shared root that gets `wem/` and `wav/`
/// subtrees (after the collision guard); two mean explicit raw and final
/// roots used as given.
async fn resolve_roots(
    dest: &Utf8Path,
    final_dest: Option<&Utf8Path>,
) -> Result<(Utf8PathBuf, Utf8PathBuf)> {
    match final_dest {
        Some(final_root) => Ok((dest.to_path_buf(), final_root.to_path_buf())),
        None => {
            pipeline::check_result_root(dest).await?;
            Ok((dest.join(RAW_DIR_NAME), dest.join(FINAL_DIR_NAME)))
        }
    }
}
