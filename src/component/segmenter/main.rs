use super::bitrate::{effective_bit_rate, expected_segment_count, needs_split, segment_seconds};
use crate::config::format_bytes;
use crate::error::PipelineError;
use crate::tools::{Transcoder, VideoProbe};
use anyhow::anyhow;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How a video is delivered: as itself, or as the ordered pieces cut from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPlan {
    segments: Vec<PathBuf>,
    split: bool,
}

impl SegmentPlan {
    #[must_use]
    pub fn unsplit(original: &Path) -> Self {
        Self {
            segments: vec![original.to_path_buf()],
            split: false,
        }
    }

    /// Never empty: an empty list is rejected.
    pub fn from_segments(segments: Vec<PathBuf>) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }
        Some(Self {
            segments,
            split: true,
        })
    }

    #[must_use]
    pub fn segments(&self) -> &[PathBuf] {
        &self.segments
    }

    #[must_use]
    pub const fn is_split(&self) -> bool {
        self.split
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Files created by the split, i.e. everything except an unsplit original.
    #[must_use]
    pub fn derived_files(&self) -> &[PathBuf] {
        if self.split { &self.segments } else { &[] }
    }
}

pub struct Segmenter {
    transcoder: Arc<dyn Transcoder>,
    max_size: u64,
}

impl Segmenter {
    #[must_use]
    pub fn new(transcoder: Arc<dyn Transcoder>, max_size: u64) -> Self {
        Self {
            transcoder,
            max_size,
        }
    }

    pub fn plan(
        &self,
        video: &Path,
        file_size: u64,
        probe: &VideoProbe,
        work_dir: &Path,
    ) -> Result<SegmentPlan, PipelineError> {
        if !needs_split(file_size, self.max_size) {
            debug!(
                "{} fits in one item ({} <= limit {})",
                video.display(),
                format_bytes(file_size),
                format_bytes(self.max_size)
            );
            return Ok(SegmentPlan::unsplit(video));
        }

        let failure = |source| PipelineError::SegmentationFailure {
            path: video.to_path_buf(),
            source,
        };

        let bit_rate = effective_bit_rate(probe.bit_rate, file_size, probe.duration_seconds);
        if bit_rate == 0 {
            return Err(failure(anyhow!("cannot determine bit rate")));
        }

        let seconds = segment_seconds(self.max_size, bit_rate);
        info!(
            "Splitting {} ({}, {} kbit/s) into ~{seconds}s segments, about {} parts",
            video.display(),
            format_bytes(file_size),
            bit_rate / 1000,
            expected_segment_count(probe.duration_seconds, seconds)
        );

        let segments = self
            .transcoder
            .segment(video, seconds, work_dir)
            .map_err(|e| PipelineError::or_cancelled(e, failure))?;

        SegmentPlan::from_segments(segments)
            .ok_or_else(|| failure(anyhow!("no segments were produced")))
    }
}
