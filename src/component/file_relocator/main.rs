use crate::component::uploader::DeliveryId;
use crate::error::PipelineError;
use crate::tools::move_file;
use anyhow::anyhow;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// `<stem>_msgid_<id><ext>`, keeping the extension's original case.
#[must_use]
pub fn done_file_name(path: &Path, id: DeliveryId) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!("{stem}_msgid_{id}{extension}")
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RelocationReport {
    pub original: PathBuf,
    pub moved_derived: Vec<PathBuf>,
    pub failed_derived: Vec<PathBuf>,
}

/// Moves delivered files into the done directory under their message id.
pub struct FileRelocator {
    done_dir: PathBuf,
}

impl FileRelocator {
    #[must_use]
    pub fn new(done_dir: &Path) -> Self {
        Self {
            done_dir: done_dir.to_path_buf(),
        }
    }

    #[must_use]
    pub fn target_for(&self, path: &Path, id: DeliveryId) -> PathBuf {
        self.done_dir.join(done_file_name(path, id))
    }

    /// The original must move or this fails. Derived files are best effort: a
    /// failed move is logged and never undoes the original's move.
    pub fn relocate(
        &self,
        original: &Path,
        id: DeliveryId,
        derived: &[PathBuf],
    ) -> Result<RelocationReport, PipelineError> {
        if !id.is_sent() {
            return Err(PipelineError::RelocateFailure {
                path: original.to_path_buf(),
                source: anyhow!("refusing to relocate without a message id"),
            });
        }

        let target = self.target_for(original, id);
        move_file(original, &target).map_err(|source| PipelineError::RelocateFailure {
            path: original.to_path_buf(),
            source,
        })?;
        info!("Moved {} -> {}", original.display(), target.display());

        let mut report = RelocationReport {
            original: target,
            ..RelocationReport::default()
        };

        for path in derived {
            let target = self.target_for(path, id);
            match move_file(path, &target) {
                Ok(()) => report.moved_derived.push(target),
                Err(e) => {
                    warn!("Cannot move {}: {e:#}", path.display());
                    report.failed_derived.push(path.clone());
                }
            }
        }

        Ok(report)
    }
}
