use std::path::{Path, PathBuf};
use std::process::Command;

/// Segment file name pattern relative to the output directory
pub const SEGMENT_PATTERN_SUFFIX: &str = "_part%03d";

/// ffmpeg invocations used by the pipeline, all stream copies except frame grabs.
#[derive(Debug, Clone, PartialEq)]
pub enum FfmpegCommand {
    /// One JPEG frame at `timestamp` seconds
    ExtractFrame {
        video: PathBuf,
        timestamp: f64,
        output: PathBuf,
    },
    /// Copy-mode cut into MPEG-TS pieces of `segment_seconds` each
    Segment {
        video: PathBuf,
        segment_seconds: u64,
        output_pattern: PathBuf,
    },
    /// Stream copy of one piece into its final container
    Remux {
        input: PathBuf,
        output: PathBuf,
        aac_to_asc: bool,
    },
}

impl FfmpegCommand {
    #[must_use]
    pub fn extract_frame(video: &Path, timestamp: f64, output: &Path) -> Self {
        Self::ExtractFrame {
            video: video.to_path_buf(),
            timestamp,
            output: output.to_path_buf(),
        }
    }

    /// `<ts_dir>/<stem>_part%03d.ts`, with `%` in the stem escaped for the segment muxer
    #[must_use]
    pub fn segment(video: &Path, segment_seconds: u64, ts_dir: &Path) -> Self {
        let stem = video
            .file_stem()
            .map_or_else(|| "video".into(), |s| s.to_string_lossy())
            .replace('%', "%%");
        Self::Segment {
            video: video.to_path_buf(),
            segment_seconds,
            output_pattern: ts_dir.join(format!("{stem}{SEGMENT_PATTERN_SUFFIX}.ts")),
        }
    }

    #[must_use]
    pub fn remux(input: &Path, output: &Path, aac_to_asc: bool) -> Self {
        Self::Remux {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            aac_to_asc,
        }
    }

    #[must_use]
    pub fn build_command(&self) -> Command {
        let mut cmd = Command::new("ffmpeg");

        match self {
            Self::ExtractFrame {
                video,
                timestamp,
                output,
            } => {
                cmd.args(["-ss", &format!("{timestamp:.2}"), "-i"])
                    .arg(video)
                    .args(["-vframes", "1", "-q:v", "2", "-y"])
                    .arg(output);
            }
            Self::Segment {
                video,
                segment_seconds,
                output_pattern,
            } => {
                cmd.args(["-hide_banner", "-loglevel", "info", "-i"])
                    .arg(video)
                    .args([
                        "-c",
                        "copy",
                        "-map",
                        "0",
                        "-f",
                        "segment",
                        "-segment_time",
                        &segment_seconds.to_string(),
                        "-reset_timestamps",
                        "1",
                    ])
                    .arg(output_pattern);
            }
            Self::Remux {
                input,
                output,
                aac_to_asc,
            } => {
                cmd.args(["-hide_banner", "-loglevel", "info", "-i"])
                    .arg(input)
                    .args(["-c", "copy"]);
                if *aac_to_asc {
                    cmd.args(["-bsf:a", "aac_adtstoasc"]);
                }
                cmd.arg(output);
            }
        }

        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(command: &Command) -> Vec<String> {
        command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_extract_frame_args() {
        let command = FfmpegCommand::extract_frame(
            Path::new("/v/a_b.mp4"),
            12.5,
            Path::new("/w/frame_003.jpg"),
        )
        .build_command();

        assert_eq!(
            args(&command),
            vec![
                "-ss",
                "12.50",
                "-i",
                "/v/a_b.mp4",
                "-vframes",
                "1",
                "-q:v",
                "2",
                "-y",
                "/w/frame_003.jpg"
            ]
        );
    }

    #[test]
    fn test_segment_args() {
        let segment = FfmpegCommand::segment(Path::new("/v/trip_alps.mkv"), 200, Path::new("/w/ts"));
        let FfmpegCommand::Segment { output_pattern, .. } = &segment else {
            panic!("expected segment command");
        };
        assert_eq!(output_pattern, Path::new("/w/ts/trip_alps_part%03d.ts"));

        let args = args(&segment.build_command());
        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-loglevel",
                "info",
                "-i",
                "/v/trip_alps.mkv",
                "-c",
                "copy",
                "-map",
                "0",
                "-f",
                "segment",
                "-segment_time",
                "200",
                "-reset_timestamps",
                "1",
                "/w/ts/trip_alps_part%03d.ts"
            ]
        );
    }

    #[test]
    fn test_segment_pattern_escapes_percent_in_stem() {
        let segment =
            FfmpegCommand::segment(Path::new("/v/promo_50%_off.mp4"), 10, Path::new("/w/ts"));
        let FfmpegCommand::Segment { output_pattern, .. } = &segment else {
            panic!("expected segment command");
        };
        assert_eq!(output_pattern, Path::new("/w/ts/promo_50%%_off_part%03d.ts"));
    }

    #[test]
    fn test_remux_bitstream_filter_only_for_aac() {
        let with_aac = FfmpegCommand::remux(Path::new("a.ts"), Path::new("a.mp4"), true);
        let without = FfmpegCommand::remux(Path::new("a.ts"), Path::new("a.mp4"), false);

        let with_aac = args(&with_aac.build_command());
        let without = args(&without.build_command());

        assert!(with_aac.windows(2).any(|w| w == ["-bsf:a", "aac_adtstoasc"]));
        assert!(!without.iter().any(|a| a == "-bsf:a"));
        assert_eq!(with_aac.last().map(String::as_str), Some("a.mp4"));
    }
}
