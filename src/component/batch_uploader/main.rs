use super::summary::BatchSummary;
use crate::component::album_builder::{AlbumBuilder, MediaItem};
use crate::component::contact_sheet_generator::{ThumbnailComposer, preview_path};
use crate::component::file_relocator::FileRelocator;
use crate::component::segmenter::Segmenter;
use crate::component::uploader::{DeliveryId, Destination, MessagingTransport, UploadOrchestrator};
use crate::config::{Config, UserSettings, format_bytes};
use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::tools::{MediaKind, ParsedName, SourceFile, Transcoder, scan_source_files};
use anyhow::{Context, Result};
use console::style;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "album_";

/// Outcome of a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub delivery_id: DeliveryId,
    /// Derived files to move next to the original
    pub retained_files: Vec<PathBuf>,
}

/// Processes every file of the source directory, one at a time, in name order.
pub struct BatchUploader {
    settings: UserSettings,
    transcoder: Arc<dyn Transcoder>,
    segmenter: Segmenter,
    composer: ThumbnailComposer,
    orchestrator: UploadOrchestrator,
    relocator: FileRelocator,
    context: PipelineContext,
}

impl BatchUploader {
    pub fn new(
        config: Config,
        transcoder: Arc<dyn Transcoder>,
        transport: Arc<dyn MessagingTransport>,
        context: PipelineContext,
    ) -> Result<Self> {
        let settings = config.settings;
        let columns = u32::try_from(settings.grid_columns).context("grid_columns too large")?;
        let rows = u32::try_from(settings.grid_rows).context("grid_rows too large")?;

        Ok(Self {
            segmenter: Segmenter::new(Arc::clone(&transcoder), settings.max_size),
            composer: ThumbnailComposer::new(Arc::clone(&transcoder), columns, rows),
            orchestrator: UploadOrchestrator::new(transport, context.clone()),
            relocator: FileRelocator::new(&settings.done_dir),
            transcoder,
            settings,
            context,
        })
    }

    /// Only an unreadable source directory or an unknown chat stops the batch;
    /// per-file failures end up in the summary.
    pub fn run(&self) -> Result<BatchSummary> {
        println!("{}", style("=== Album upload ===").cyan().bold());

        let destination = self.orchestrator.resolve_destination(self.settings.chat_id)?;
        let files = scan_source_files(&self.settings.source_dir)?;
        let mut summary = BatchSummary::default();

        if files.is_empty() {
            println!("{}", style("No files to upload").yellow());
            return Ok(summary);
        }
        println!(
            "{}",
            style(format!(
                "Found {} files in {}",
                files.len(),
                self.settings.source_dir.display()
            ))
            .green()
        );

        for (index, file) in files.iter().enumerate() {
            if self.context.is_cancelled() {
                warn!("Interrupt received, stopping before {}", file.file_name);
                summary.cancelled = true;
                break;
            }

            println!(
                "\n{} [{}/{}] {}",
                style("Processing").cyan(),
                index + 1,
                files.len(),
                style(&file.file_name).bold()
            );

            let size_kb = kilobytes(file.size);
            match self.process_file(&destination, file) {
                Ok(result) => {
                    info!(
                        "[SUCCESS] {} ({size_kb:.2} KB) as message {}",
                        file.file_name, result.delivery_id
                    );
                    println!("  {} message {}", style("✓").green(), result.delivery_id);
                    summary.record_success();
                }
                Err(e) => {
                    error!(
                        "[FAILED] {} ({size_kb:.2} KB) - Error: {e}",
                        file.file_name
                    );
                    println!("  {} {e}", style("✗").red());
                    summary.record_failure(&file.file_name, e.kind(), e.to_string());
                    if matches!(e, PipelineError::Cancelled) {
                        summary.cancelled = true;
                        break;
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Parse, deliver, relocate. The source file is only touched by the final move.
    pub fn process_file(
        &self,
        destination: &Destination,
        file: &SourceFile,
    ) -> Result<DeliveryResult, PipelineError> {
        let parsed = ParsedName::parse(&file.file_name)?;
        let caption = parsed.caption();
        let kind = MediaKind::from_path(&file.path);
        info!("{} is a {kind}, caption {caption:?}", file.file_name);

        let (result, workspace) = match kind {
            MediaKind::Video => {
                let workspace = self.create_workspace()?;
                let result = self
                    .deliver_video(destination, file, &caption, workspace.path())
                    .and_then(|result| self.relocate(file, result));
                (result, Some(workspace))
            }
            MediaKind::Photo | MediaKind::Audio | MediaKind::Document => {
                let result = self
                    .deliver_single(destination, file, kind, &caption)
                    .and_then(|result| self.relocate(file, result));
                (result, None)
            }
        };

        if let Some(workspace) = workspace {
            self.release_workspace(workspace);
        }
        result
    }

    fn deliver_single(
        &self,
        destination: &Destination,
        file: &SourceFile,
        kind: MediaKind,
        caption: &str,
    ) -> Result<DeliveryResult, PipelineError> {
        let item = MediaItem::new(&file.path, kind, caption);
        let delivery_id = self.orchestrator.upload_single(destination, &item)?;

        Ok(DeliveryResult {
            delivery_id,
            retained_files: Vec::new(),
        })
    }

    /// probe -> split -> preview -> album -> upload, all scratch files in `work_dir`.
    fn deliver_video(
        &self,
        destination: &Destination,
        file: &SourceFile,
        caption: &str,
        work_dir: &Path,
    ) -> Result<DeliveryResult, PipelineError> {
        let probe = self.transcoder.probe(&file.path).map_err(|e| {
            PipelineError::or_cancelled(e, |source| PipelineError::ProbeFailure {
                path: file.path.clone(),
                source,
            })
        })?;
        info!(
            "{}: {:.1}s, {}x{}, {} kbit/s",
            file.file_name,
            probe.duration_seconds,
            probe.width,
            probe.height,
            probe.bit_rate / 1000
        );

        let plan = self.segmenter.plan(&file.path, file.size, &probe, work_dir)?;
        AlbumBuilder::ensure_fits(plan.len())?;
        self.context.ensure_active()?;

        let preview = preview_path(work_dir, &file.path);
        let grid = self
            .composer
            .compose(&file.path, probe.duration_seconds, &preview, work_dir)?;

        let album = AlbumBuilder::build(&grid, caption, &plan, &probe)?;
        info!(
            "Uploading album of {} items (1 preview + {} video parts)",
            album.len(),
            plan.len()
        );
        let delivery_id = self.orchestrator.upload_album(destination, &album)?;

        let mut retained_files = vec![grid.path];
        retained_files.extend_from_slice(plan.derived_files());

        Ok(DeliveryResult {
            delivery_id,
            retained_files,
        })
    }

    /// Runs to completion once started, even after an interrupt, so a delivered
    /// file never stays in the source directory because of a half-done move.
    fn relocate(
        &self,
        file: &SourceFile,
        result: DeliveryResult,
    ) -> Result<DeliveryResult, PipelineError> {
        match self
            .relocator
            .relocate(&file.path, result.delivery_id, &result.retained_files)
        {
            Ok(report) => {
                if !report.failed_derived.is_empty() {
                    warn!(
                        "{} derived file(s) of {} stayed behind",
                        report.failed_derived.len(),
                        file.file_name
                    );
                }
                Ok(result)
            }
            Err(e) => {
                error!(
                    "{} was delivered as message {} but could not be moved",
                    file.file_name, result.delivery_id
                );
                Err(e)
            }
        }
    }

    fn create_workspace(&self) -> Result<TempDir, PipelineError> {
        let workspace = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&self.settings.temp_dir)?;
        info!("Working in {}", workspace.path().display());
        Ok(workspace)
    }

    fn release_workspace(&self, workspace: TempDir) {
        if self.settings.keep_temp_dir {
            let path = workspace.keep();
            info!("Keeping scratch directory {}", path.display());
            return;
        }

        let path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            warn!("Cannot remove scratch directory {}: {e}", path.display());
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn kilobytes(size: u64) -> f64 {
    size as f64 / 1024.0
}

/// One-line description of the run configuration.
#[must_use]
pub fn describe_settings(settings: &UserSettings) -> String {
    let limit = if settings.max_size == 0 {
        "no size limit".to_string()
    } else {
        format!("max item size {}", format_bytes(settings.max_size))
    };
    format!(
        "chat {}, {limit}, preview grid {}x{}",
        settings.chat_id, settings.grid_columns, settings.grid_rows
    )
}
