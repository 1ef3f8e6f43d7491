use crate::tools::Transcoder;
use anyhow::Result;
use log::debug;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// `count` evenly spaced points in `[0, duration)`: `duration / count * i`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sample_timestamps(duration_seconds: f64, count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }

    let step = duration_seconds / count as f64;
    (0..count).map(|i| step * i as f64).collect()
}

#[must_use]
pub fn frame_path(frames_dir: &Path, index: usize) -> PathBuf {
    frames_dir.join(format!("frame_{index:03}.jpg"))
}

/// Extracts one frame per timestamp in parallel, returned in timestamp order.
///
/// All-or-nothing: if any extraction fails, every frame written so far is removed.
pub fn extract_frames(
    transcoder: &dyn Transcoder,
    video: &Path,
    timestamps: &[f64],
    frames_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let result: Result<Vec<PathBuf>> = timestamps
        .par_iter()
        .enumerate()
        .map(|(index, &timestamp)| {
            let output = frame_path(frames_dir, index);
            debug!("Frame {index} at {timestamp:.2}s -> {}", output.display());
            transcoder.extract_frame(video, timestamp, &output)
        })
        .collect();

    if result.is_err() {
        for index in 0..timestamps.len() {
            let path = frame_path(frames_dir, index);
            if path.exists() {
                let _ = fs::remove_file(&path);
            }
        }
    }

    result
}
