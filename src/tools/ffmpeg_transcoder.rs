use crate::tools::command_runner::run_command;
use crate::tools::ffmpeg_command::FfmpegCommand;
use crate::tools::ffprobe_info::{
    ProbeQuery, parse_bit_rate, parse_codec_name, parse_duration, parse_resolution,
};
use crate::tools::transcoder::Transcoder;
use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

const TS_DIR: &str = "ts";

/// [`Transcoder`] that shells out to `ffprobe` and `ffmpeg`.
pub struct FfmpegTranscoder {
    shutdown_signal: Arc<AtomicBool>,
}

impl FfmpegTranscoder {
    #[must_use]
    pub const fn new(shutdown_signal: Arc<AtomicBool>) -> Self {
        Self { shutdown_signal }
    }

    fn query(&self, query: ProbeQuery, video: &Path) -> Result<String> {
        let output = run_command(query.build_command(video), &self.shutdown_signal)
            .with_context(|| format!("ffprobe {query:?} failed for {}", video.display()))?;
        Ok(output.stdout)
    }

    /// `None` when there is no audio stream or the query failed.
    fn audio_codec(&self, video: &Path) -> Option<String> {
        match self.query(ProbeQuery::AudioCodec, video) {
            Ok(stdout) => parse_codec_name(&stdout),
            Err(e) => {
                warn!("Cannot read audio codec of {}: {e:#}", video.display());
                None
            }
        }
    }

    fn run(&self, command: &FfmpegCommand) -> Result<()> {
        run_command(command.build_command(), &self.shutdown_signal)?;
        Ok(())
    }

    fn cut_and_remux(
        &self,
        video: &Path,
        segment_seconds: u64,
        work_dir: &Path,
        ts_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(ts_dir)
            .with_context(|| format!("cannot create {}", ts_dir.display()))?;

        self.run(&FfmpegCommand::segment(video, segment_seconds, ts_dir))
            .context("ffmpeg segmentation failed")?;

        let pieces = list_pieces(ts_dir)?;
        if pieces.is_empty() {
            bail!("ffmpeg produced no segments in {}", ts_dir.display());
        }
        info!(
            "Split {} into {} pieces of ~{segment_seconds}s",
            video.display(),
            pieces.len()
        );

        let aac_to_asc = self.audio_codec(video).as_deref() == Some("aac");

        let mut segments = Vec::with_capacity(pieces.len());
        for piece in &pieces {
            let stem = piece
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let output = work_dir.join(format!("{stem}.mp4"));

            self.run(&FfmpegCommand::remux(piece, &output, aac_to_asc))
                .with_context(|| format!("ffmpeg remux failed for {}", piece.display()))?;
            debug!("Remuxed {} -> {}", piece.display(), output.display());
            segments.push(output);
        }

        Ok(segments)
    }
}

impl Transcoder for FfmpegTranscoder {
    fn duration(&self, video: &Path) -> Result<f64> {
        parse_duration(&self.query(ProbeQuery::Duration, video)?)
    }

    fn bit_rate(&self, video: &Path) -> Result<u64> {
        parse_bit_rate(&self.query(ProbeQuery::BitRate, video)?)
    }

    fn resolution(&self, video: &Path) -> Result<(u32, u32)> {
        parse_resolution(&self.query(ProbeQuery::Resolution, video)?)
    }

    fn extract_frame(&self, video: &Path, timestamp: f64, output: &Path) -> Result<PathBuf> {
        self.run(&FfmpegCommand::extract_frame(video, timestamp, output))
            .with_context(|| format!("frame extraction at {timestamp:.2}s failed"))?;

        if !output.exists() {
            bail!("ffmpeg wrote no frame to {}", output.display());
        }
        Ok(output.to_path_buf())
    }

    fn segment(
        &self,
        video: &Path,
        segment_seconds: u64,
        work_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let ts_dir = work_dir.join(TS_DIR);
        let result = self.cut_and_remux(video, segment_seconds, work_dir, &ts_dir);

        if ts_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&ts_dir) {
                warn!("Cannot remove {}: {e}", ts_dir.display());
            }
        }

        result
    }
}

/// MPEG-TS pieces in name order, which is playback order for `%03d` patterns.
fn list_pieces(ts_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pieces: Vec<PathBuf> = fs::read_dir(ts_dir)
        .with_context(|| format!("cannot list {}", ts_dir.display()))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("ts"))
        })
        .collect();

    pieces.sort();
    Ok(pieces)
}
