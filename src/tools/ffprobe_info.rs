use anyhow::{Context, Result, anyhow, bail};
use std::path::Path;
use std::process::Command;

const BARE_VALUE_FORMAT: &str = "default=noprint_wrappers=1:nokey=1";

/// Which ffprobe query to run. Every query prints bare values, one per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeQuery {
    Duration,
    BitRate,
    Resolution,
    AudioCodec,
}

impl ProbeQuery {
    const fn stream_selector(self) -> Option<&'static str> {
        match self {
            Self::Duration | Self::BitRate => None,
            Self::Resolution => Some("v:0"),
            Self::AudioCodec => Some("a:0"),
        }
    }

    const fn entries(self) -> &'static str {
        match self {
            Self::Duration => "format=duration",
            Self::BitRate => "format=bit_rate",
            Self::Resolution => "stream=width,height",
            Self::AudioCodec => "stream=codec_name",
        }
    }

    #[must_use]
    pub fn build_command(self, path: &Path) -> Command {
        let mut command = Command::new("ffprobe");
        command.args(["-v", "error"]);
        if let Some(selector) = self.stream_selector() {
            command.args(["-select_streams", selector]);
        }
        command
            .args(["-show_entries", self.entries(), "-of", BARE_VALUE_FORMAT])
            .arg(path);
        command
    }
}

pub fn parse_duration(stdout: &str) -> Result<f64> {
    let value = first_value(stdout).ok_or_else(|| anyhow!("ffprobe returned no duration"))?;
    let duration: f64 = value
        .parse()
        .with_context(|| format!("invalid duration: {value:?}"))?;
    if !duration.is_finite() {
        bail!("invalid duration: {value:?}");
    }
    Ok(duration)
}

/// Missing bitrate metadata (empty output or `N/A`) is reported as 0.
pub fn parse_bit_rate(stdout: &str) -> Result<u64> {
    match first_value(stdout) {
        None | Some("N/A") => Ok(0),
        Some(value) => value
            .parse()
            .with_context(|| format!("invalid bit rate: {value:?}")),
    }
}

pub fn parse_resolution(stdout: &str) -> Result<(u32, u32)> {
    let mut values = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
    let (Some(width), Some(height)) = (values.next(), values.next()) else {
        bail!("ffprobe returned no video resolution: {:?}", stdout.trim());
    };

    let width: u32 = width
        .parse()
        .with_context(|| format!("invalid width: {width:?}"))?;
    let height: u32 = height
        .parse()
        .with_context(|| format!("invalid height: {height:?}"))?;
    Ok((width, height))
}

/// `None` when the file has no audio stream.
#[must_use]
pub fn parse_codec_name(stdout: &str) -> Option<String> {
    first_value(stdout).map(str::to_string)
}

fn first_value(stdout: &str) -> Option<&str> {
    stdout.lines().map(str::trim).find(|line| !line.is_empty())
}
