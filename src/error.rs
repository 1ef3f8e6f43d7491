use std::path::PathBuf;
use thiserror::Error;

/// Per-file pipeline failures. None of these abort the batch.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid filename format: expected TAG_DESCRIPTION.ext, got {file_name} ({reason})")]
    InvalidFilenameFormat {
        file_name: String,
        reason: &'static str,
    },

    #[error("probe failed for {}: {source:#}", path.display())]
    ProbeFailure {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to split {}: {source:#}", path.display())]
    SegmentationFailure {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to build preview for {}: {source:#}", path.display())]
    ThumbnailFailure {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error(
        "album would have {items} items (1 preview + {segments} video parts), exceeds limit of {limit}"
    )]
    AlbumTooLarge {
        items: usize,
        segments: usize,
        limit: usize,
    },

    #[error("album has no items")]
    EmptyAlbum,

    #[error("upload failed for {}: {source:#}", path.display())]
    UploadFailure {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to move {}: {source:#}", path.display())]
    RelocateFailure {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("scratch directory error: {0}")]
    Workspace(#[from] std::io::Error),

    #[error("operation cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Short label used in per-file log lines and the failure list.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFilenameFormat { .. } => "InvalidFilenameFormat",
            Self::ProbeFailure { .. } => "ProbeFailure",
            Self::SegmentationFailure { .. } => "SegmentationFailure",
            Self::ThumbnailFailure { .. } => "ThumbnailFailure",
            Self::AlbumTooLarge { .. } => "AlbumTooLarge",
            Self::EmptyAlbum => "EmptyAlbum",
            Self::UploadFailure { .. } => "UploadFailure",
            Self::RelocateFailure { .. } => "RelocateFailure",
            Self::Workspace(_) => "Workspace",
            Self::Cancelled => "Cancelled",
        }
    }

    /// True when `error` or anything in its source chain is [`Self::Cancelled`].
    #[must_use]
    pub fn is_cancellation(error: &anyhow::Error) -> bool {
        error
            .chain()
            .any(|cause| matches!(cause.downcast_ref::<Self>(), Some(Self::Cancelled)))
    }

    /// Wraps a stage error with `wrap`, unless it came from an interrupt.
    pub fn or_cancelled(error: anyhow::Error, wrap: impl FnOnce(anyhow::Error) -> Self) -> Self {
        if Self::is_cancellation(&error) {
            Self::Cancelled
        } else {
            wrap(error)
        }
    }
}
