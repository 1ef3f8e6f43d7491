use crate::error::PipelineError;
use crate::tools::MediaKind;
use log::debug;
use std::path::{Path, PathBuf};

/// Most items a single album message may carry.
pub const MAX_ALBUM_ITEMS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub caption: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl MediaItem {
    #[must_use]
    pub fn new(path: &Path, kind: MediaKind, caption: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
            caption: caption.into(),
            width: None,
            height: None,
        }
    }

    #[must_use]
    pub const fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Ordered items of one album, between 1 and [`MAX_ALBUM_ITEMS`].
///
/// Only the first item keeps its caption; the receiving side shows just that one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumRequest {
    items: Vec<MediaItem>,
}

impl AlbumRequest {
    pub fn new(mut items: Vec<MediaItem>) -> Result<Self, PipelineError> {
        if items.is_empty() {
            return Err(PipelineError::EmptyAlbum);
        }
        if items.len() > MAX_ALBUM_ITEMS {
            return Err(PipelineError::AlbumTooLarge {
                items: items.len(),
                segments: items.len() - 1,
                limit: MAX_ALBUM_ITEMS,
            });
        }

        for item in items.iter_mut().skip(1) {
            if !item.caption.is_empty() {
                debug!("Dropping caption of {}", item.path.display());
                item.caption.clear();
            }
        }

        Ok(Self { items })
    }

    #[must_use]
    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<MediaItem> {
        self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; kept for the `len` convention.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn caption(&self) -> &str {
        self.items.first().map_or("", |item| item.caption.as_str())
    }
}
