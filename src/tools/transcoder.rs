use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// Measured properties of one video. `bit_rate` 0 means the container had none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProbe {
    pub duration_seconds: f64,
    pub bit_rate: u64,
    pub width: u32,
    pub height: u32,
}

/// Inspection and cutting capability backed by an external media tool.
///
/// All calls block until the tool has finished. Implementations must be usable
/// from several threads at once since frames are extracted in parallel.
pub trait Transcoder: Send + Sync {
    fn duration(&self, video: &Path) -> Result<f64>;

    fn bit_rate(&self, video: &Path) -> Result<u64>;

    fn resolution(&self, video: &Path) -> Result<(u32, u32)>;

    /// Runs the three queries and rejects a non-positive duration.
    fn probe(&self, video: &Path) -> Result<VideoProbe> {
        let duration_seconds = self.duration(video)?;
        if duration_seconds <= 0.0 {
            bail!("video has no duration ({duration_seconds}s)");
        }
        let bit_rate = self.bit_rate(video)?;
        let (width, height) = self.resolution(video)?;

        Ok(VideoProbe {
            duration_seconds,
            bit_rate,
            width,
            height,
        })
    }

    /// Writes one still image taken at `timestamp` to `output` and returns its path.
    fn extract_frame(&self, video: &Path, timestamp: f64, output: &Path) -> Result<PathBuf>;

    /// Cuts `video` into pieces of roughly `segment_seconds` inside `work_dir`,
    /// returning the produced files in playback order.
    fn segment(&self, video: &Path, segment_seconds: u64, work_dir: &Path)
    -> Result<Vec<PathBuf>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe {
        duration: f64,
    }

    impl Transcoder for FixedProbe {
        fn duration(&self, _video: &Path) -> Result<f64> {
            Ok(self.duration)
        }

        fn bit_rate(&self, _video: &Path) -> Result<u64> {
            Ok(0)
        }

        fn resolution(&self, _video: &Path) -> Result<(u32, u32)> {
            Ok((1280, 720))
        }

        fn extract_frame(&self, _video: &Path, _timestamp: f64, output: &Path) -> Result<PathBuf> {
            Ok(output.to_path_buf())
        }

        fn segment(&self, video: &Path, _secs: u64, _work_dir: &Path) -> Result<Vec<PathBuf>> {
            Ok(vec![video.to_path_buf()])
        }
    }

    #[test]
    fn test_probe_collects_all_queries() {
        let probe = FixedProbe { duration: 50.0 }
            .probe(Path::new("a_b.mp4"))
            .unwrap();
        assert_eq!(
            probe,
            VideoProbe {
                duration_seconds: 50.0,
                bit_rate: 0,
                width: 1280,
                height: 720
            }
        );
    }

    #[test]
    fn test_probe_rejects_zero_duration() {
        assert!(FixedProbe { duration: 0.0 }.probe(Path::new("a_b.mp4")).is_err());
    }
}
