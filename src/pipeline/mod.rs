//! Pipeline coordinator - sequences one asset kind end to end.
//!
//! Stage order is fixed and hard-barriered: scan the source for archives,
//! unpack them all, rescan the raw tree, mirror destination folders, convert
//! every stream. No stage overlaps the next; the worker pool bounds
//! parallelism inside a stage.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::metrics::Metrics;
use crate::mirror::{self, FolderSet};
use crate::naming::TokenGenerator;
use crate::pool::{WorkUnit, WorkerPool};
use crate::scanner;
use crate::services::ToolKit;

/// Subfolder names the pipeline claims under a shared destination root.
pub const RAW_DIR_NAME: &str = "wem";
pub const FINAL_DIR_NAME: &str = "wav";

/// Extension of the intermediate raw streams produced by extraction.
pub const RAW_EXT: &str = ".wem";
/// Extension of the converted output.
pub const FINAL_EXT: &str = ".wav";

/// The archive kinds the pipeline knows how to rip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Wwise `.pck` soundbank archives, unpacked by QuickBMS.
    Pck,
    /// Wwise `.bnk` banks, unpacked by bnkextr. Extraction emits `.wav`-named
    /// raw streams which are renamed to `.wem` before conversion.
    Bnk,
}

impl ArchiveKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveKind::Pck => ".pck",
            ArchiveKind::Bnk => ".bnk",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ArchiveKind::Pck => "pck",
            ArchiveKind::Bnk => "bnk",
        }
    }
}

/// Fatal pre-flight failures. These abort before any extraction starts and
/// map to a nonzero process exit.
#[derive(Error, Debug)]
pub enum PreflightError {
    #[error(
        "Result folder already exists. Please remove the following entries from {root}: {}",
        .names.join(", ")
    )]
    Collision { root: Utf8PathBuf, names: Vec<String> },
}

/// Refuse to run against a destination root that already contains entries
/// named for the output trees. Silently merging into a previous run's output
/// would make collisions between runs undetectable.
///
/// A destination root that does not exist yet passes the check.
pub async fn check_result_root(root: &Utf8Path) -> Result<()> {
    if !root.exists() {
        return Ok(());
    }

    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(root)
        .await
        .with_context(|| format!("Failed to list destination root: {}", root))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to read directory entry in {}", root))?
    {
        let name = entry.file_name().to_string_lossy().to_string();
        if name == RAW_DIR_NAME || name == FINAL_DIR_NAME {
            names.push(name);
        }
    }

    if !names.is_empty() {
        names.sort();
        return Err(PreflightError::Collision {
            root: root.to_path_buf(),
            names,
        }
        .into());
    }

    Ok(())
}

/// Per-run pipeline options.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Unpack-stage worker override; None means twice the logical CPU count.
    pub unpack_concurrency: Option<usize>,
    /// Stage archives into the tool bundle's input folder and run its batch
    /// script once, instead of invoking the extractor per archive.
    pub staged: bool,
}

/// Drives scan -> unpack -> rescan -> mirror -> convert for one asset kind.
pub struct Pipeline {
    tools: Arc<ToolKit>,
    metrics: Arc<Metrics>,
    tokens: TokenGenerator,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(tools: Arc<ToolKit>, metrics: Arc<Metrics>, options: PipelineOptions) -> Self {
        Self {
            tools,
            metrics,
            tokens: TokenGenerator::new(),
            options,
        }
    }

    /// Run the whole pipeline for `kind`.
    ///
    /// `raw_root` receives the per-archive extraction folders, `final_root`
    /// the mirrored converted tree. Both are created if missing. Every stage
    /// must complete before the next starts; the first failure aborts the
    /// batch (in-flight units drain, see [`WorkerPool`]).
    pub async fn run(
        &self,
        kind: ArchiveKind,
        source: &Utf8Path,
        raw_root: &Utf8Path,
        final_root: &Utf8Path,
    ) -> Result<()> {
        tokio::fs::create_dir_all(raw_root)
            .await
            .with_context(|| format!("Failed to create raw output root: {}", raw_root))?;
        tokio::fs::create_dir_all(final_root)
            .await
            .with_context(|| format!("Failed to create final output root: {}", final_root))?;

        let archives = scanner::scan(source.to_path_buf(), kind.extension().to_string()).await?;
        tracing::info!("Found {} {} files", archives.len(), kind.label());
        self.metrics.record_archives_found(archives.len());

        // Directories created during unpacking are remembered here so the
        // mirroring pass does not recreate them.
        let folders = FolderSet::new();
        folders.insert(final_root);

        tracing::info!("Unpacking...");
        if self.options.staged {
            self.unpack_staged(kind, &archives, raw_root, final_root, &folders)
                .await?;
        } else {
            self.unpack_direct(kind, &archives, raw_root, final_root, &folders)
                .await?;
        }

        if kind == ArchiveKind::Bnk {
            self.rename_extracted(raw_root).await?;
        }

        let streams = scanner::scan(raw_root.to_path_buf(), RAW_EXT.to_string()).await?;
        tracing::info!("Found {} wem files", streams.len());
        self.metrics.record_streams_found(streams.len());

        mirror::mirror_folders(&streams, raw_root, final_root, &folders).await?;

        tracing::info!("Converting...");
        self.convert(streams, raw_root, final_root).await?;

        Ok(())
    }

    /// Stage 3, direct mechanics: one extractor invocation per archive, each
    /// into a fresh token-named folder pair.
    async fn unpack_direct(
        &self,
        kind: ArchiveKind,
        archives: &[Utf8PathBuf],
        raw_root: &Utf8Path,
        final_root: &Utf8Path,
        folders: &FolderSet,
    ) -> Result<()> {
        let mut units: Vec<WorkUnit> = Vec::with_capacity(archives.len());

        for archive in archives {
            let token = self.tokens.next();
            let raw_dir = raw_root.join(&token);
            let final_dir = final_root.join(&token);
            let archive = archive.clone();
            let tools = Arc::clone(&self.tools);
            let metrics = Arc::clone(&self.metrics);
            let folders = folders.clone();

            units.push(Box::pin(async move {
                tokio::fs::create_dir(&raw_dir)
                    .await
                    .with_context(|| format!("Failed to create unpack folder: {}", raw_dir))?;
                folders.ensure(&final_dir).await?;

                let started = Instant::now();
                let result = match kind {
                    ArchiveKind::Pck => tools.unpack_pck(&archive, &raw_dir).await,
                    ArchiveKind::Bnk => tools.extract_bnk(&archive, &raw_dir).await,
                };
                metrics.record_tool_time(started.elapsed());

                if result.is_err() {
                    metrics.record_unit_failed();
                }
                result.with_context(|| format!("Failed to unpack {}", archive))?;
                metrics.record_archive_unpacked();
                Ok(())
            }));
        }

        self.unpack_pool().run(units).await
    }

    /// Stage 3, staged mechanics: copy every archive into the tool-owned
    /// input folder under its token name, run the monolithic batch script
    /// once, then move each token folder from the tool-owned output into the
    /// raw tree.
    async fn unpack_staged(
        &self,
        kind: ArchiveKind,
        archives: &[Utf8PathBuf],
        raw_root: &Utf8Path,
        final_root: &Utf8Path,
        folders: &FolderSet,
    ) -> Result<()> {
        let staging_in = self.tools.staging_input_dir().to_path_buf();
        let staging_out = self.tools.staging_output_dir().to_path_buf();

        tokio::fs::create_dir_all(&staging_in)
            .await
            .with_context(|| format!("Failed to create staging input folder: {}", staging_in))?;
        tokio::fs::create_dir_all(&staging_out)
            .await
            .with_context(|| format!("Failed to create staging output folder: {}", staging_out))?;

        let mut leftovers = tokio::fs::read_dir(&staging_in)
            .await
            .with_context(|| format!("Failed to list staging input folder: {}", staging_in))?;
        if leftovers.next_entry().await?.is_some() {
            bail!(
                "Staging input folder {} is not empty; a previous run's archives would be mixed in",
                staging_in
            );
        }

        // Copy phase runs at unpack concurrency; the batch script itself is a
        // single invocation.
        let mut tokens = Vec::with_capacity(archives.len());
        let mut units: Vec<WorkUnit> = Vec::with_capacity(archives.len());

        for archive in archives {
            let token = self.tokens.next();
            let staged = staging_in.join(format!("{}{}", token, kind.extension()));
            let final_dir = final_root.join(&token);
            let archive = archive.clone();
            let folders = folders.clone();
            tokens.push(token);

            units.push(Box::pin(async move {
                folders.ensure(&final_dir).await?;
                tokio::fs::copy(&archive, &staged)
                    .await
                    .with_context(|| format!("Failed to stage {} as {}", archive, staged))?;
                Ok(())
            }));
        }

        self.unpack_pool().run(units).await?;

        let started = Instant::now();
        let result = self.tools.run_batch_script().await;
        self.metrics.record_tool_time(started.elapsed());
        if result.is_err() {
            self.metrics.record_unit_failed();
        }
        result.context("Batch unpack script failed")?;

        // The staged copies are temporaries; leave the tool-owned input
        // folder as it was found so the next run passes the emptiness check.
        for token in &tokens {
            let staged = staging_in.join(format!("{}{}", token, kind.extension()));
            tokio::fs::remove_file(&staged)
                .await
                .with_context(|| format!("Failed to remove staged archive: {}", staged))?;
        }

        for token in tokens {
            let produced = staging_out.join(&token);
            if !produced.is_dir() {
                tracing::warn!("Batch script produced no output for {}", produced);
                continue;
            }
            let target = raw_root.join(&token);
            tokio::fs::rename(&produced, &target)
                .await
                .with_context(|| format!("Failed to move {} to {}", produced, target))?;
            self.metrics.record_archive_unpacked();
        }

        Ok(())
    }

    /// Bank extraction emits `.wav`-named files that are really raw streams;
    /// rename them in place so the rescan picks them up.
    async fn rename_extracted(&self, raw_root: &Utf8Path) -> Result<()> {
        let extracted = scanner::scan(raw_root.to_path_buf(), FINAL_EXT.to_string()).await?;
        let count = extracted.len();

        for file in extracted {
            let renamed = file.with_extension("wem");
            tokio::fs::rename(&file, &renamed)
                .await
                .with_context(|| format!("Failed to rename {} to {}", file, renamed))?;
        }

        tracing::info!("Renamed {} extracted streams to wem", count);
        Ok(())
    }

    /// Stage 7: one converter invocation per stream, serialized. The
    /// destination mirrors the raw tree under the final root with the
    /// extension swapped.
    async fn convert(
        &self,
        streams: Vec<Utf8PathBuf>,
        raw_root: &Utf8Path,
        final_root: &Utf8Path,
    ) -> Result<()> {
        let mut units: Vec<WorkUnit> = Vec::with_capacity(streams.len());

        for stream in streams {
            let dest = mirror::remap(&stream, raw_root, final_root)?.with_extension("wav");
            let tools = Arc::clone(&self.tools);
            let metrics = Arc::clone(&self.metrics);

            units.push(Box::pin(async move {
                let started = Instant::now();
                let result = tools.convert_wem(&stream, &dest).await;
                metrics.record_tool_time(started.elapsed());

                if result.is_err() {
                    metrics.record_unit_failed();
                }
                result.with_context(|| format!("Failed to convert {}", stream))?;
                metrics.record_stream_converted();
                Ok(())
            }));
        }

        WorkerPool::with_concurrency(1).run(units).await
    }

    fn unpack_pool(&self) -> WorkerPool {
        match self.options.unpack_concurrency {
            Some(concurrency) => WorkerPool::with_concurrency(concurrency),
            None => WorkerPool::new(),
        }
    }
}
