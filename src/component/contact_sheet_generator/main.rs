use super::contact_sheet_merger::create_contact_sheet;
use super::frame_sampler::{extract_frames, sample_timestamps};
use crate::error::PipelineError;
use crate::tools::Transcoder;
use anyhow::Context;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const FRAMES_DIR: &str = "frames";

/// A composed preview image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailGrid {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
    pub columns: u32,
    pub rows: u32,
}

/// `<stem>_preview.jpg` inside `work_dir`
#[must_use]
pub fn preview_path(work_dir: &Path, video: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .map_or_else(|| "video".into(), |s| s.to_string_lossy());
    work_dir.join(format!("{stem}_preview.jpg"))
}

/// Samples `columns * rows` frames across a video and lays them out in one image.
pub struct ThumbnailComposer {
    transcoder: Arc<dyn Transcoder>,
    columns: u32,
    rows: u32,
}

impl ThumbnailComposer {
    #[must_use]
    pub fn new(transcoder: Arc<dyn Transcoder>, columns: u32, rows: u32) -> Self {
        Self {
            transcoder,
            columns,
            rows,
        }
    }

    #[must_use]
    pub const fn frame_count(&self) -> usize {
        (self.columns as usize) * (self.rows as usize)
    }

    /// Frames live in `work_dir/frames` and are removed whatever the outcome.
    pub fn compose(
        &self,
        video: &Path,
        duration_seconds: f64,
        output: &Path,
        work_dir: &Path,
    ) -> Result<ThumbnailGrid, PipelineError> {
        let frames_dir = work_dir.join(FRAMES_DIR);
        let result = self.compose_in(video, duration_seconds, output, &frames_dir);

        if frames_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&frames_dir) {
                warn!("Cannot remove {}: {e}", frames_dir.display());
            }
        }

        result.map_err(|e| {
            PipelineError::or_cancelled(e, |source| PipelineError::ThumbnailFailure {
                path: video.to_path_buf(),
                source,
            })
        })
    }

    fn compose_in(
        &self,
        video: &Path,
        duration_seconds: f64,
        output: &Path,
        frames_dir: &Path,
    ) -> anyhow::Result<ThumbnailGrid> {
        fs::create_dir_all(frames_dir)
            .with_context(|| format!("cannot create {}", frames_dir.display()))?;

        let timestamps = sample_timestamps(duration_seconds, self.frame_count());
        let frames = extract_frames(self.transcoder.as_ref(), video, &timestamps, frames_dir)?;
        let layout = create_contact_sheet(&frames, output, self.columns, self.rows)?;
        let (width, height) = layout.canvas_size();

        info!(
            "Preview {} ({width}x{height}, {} frames)",
            output.display(),
            frames.len()
        );

        Ok(ThumbnailGrid {
            path: output.to_path_buf(),
            width,
            height,
            frame_count: frames.len(),
            columns: self.columns,
            rows: self.rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    /// Renders solid PNG frames instead of decoding video.
    struct SolidFrames {
        fail: bool,
    }

    impl Transcoder for SolidFrames {
        fn duration(&self, _video: &Path) -> Result<f64> {
            Ok(30.0)
        }

        fn bit_rate(&self, _video: &Path) -> Result<u64> {
            Ok(0)
        }

        fn resolution(&self, _video: &Path) -> Result<(u32, u32)> {
            Ok((64, 36))
        }

        fn extract_frame(&self, _video: &Path, timestamp: f64, output: &Path) -> Result<PathBuf> {
            if self.fail && timestamp > 10.0 {
                bail!("corrupt packet");
            }
            RgbImage::from_pixel(64, 36, Rgb([10, 20, 30])).save(output)?;
            Ok(output.to_path_buf())
        }

        fn segment(&self, _video: &Path, _secs: u64, _work_dir: &Path) -> Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_preview_path() {
        assert_eq!(
            preview_path(Path::new("/w"), Path::new("/in/trip_alps.mp4")),
            PathBuf::from("/w/trip_alps_preview.jpg")
        );
    }

    #[test]
    fn test_compose_grid() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("a_b_preview.jpg");
        let composer = ThumbnailComposer::new(Arc::new(SolidFrames { fail: false }), 3, 2);

        let grid = composer
            .compose(Path::new("a_b.mp4"), 30.0, &output, temp_dir.path())
            .unwrap();

        assert_eq!(grid.frame_count, 6);
        assert_eq!((grid.width, grid.height), (960, 360));
        assert!(output.exists());
        assert!(!temp_dir.path().join(FRAMES_DIR).exists());
    }

    #[test]
    fn test_compose_failure_cleans_frames() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("a_b_preview.jpg");
        let composer = ThumbnailComposer::new(Arc::new(SolidFrames { fail: true }), 3, 2);

        let err = composer
            .compose(Path::new("a_b.mp4"), 30.0, &output, temp_dir.path())
            .unwrap_err();

        assert_eq!(err.kind(), "ThumbnailFailure");
        assert!(!output.exists());
        assert!(!temp_dir.path().join(FRAMES_DIR).exists());
    }
}
