use log::{debug, warn};
use std::path::PathBuf;

pub const REQUIRED_TOOLS: [&str; 2] = ["ffmpeg", "ffprobe"];

/// Looks up the external media tools on `PATH` and warns about missing ones.
/// Returns the names that could not be found; non-video files still work without them.
pub fn check_external_tools() -> Vec<&'static str> {
    REQUIRED_TOOLS
        .into_iter()
        .filter(|tool| match locate(tool) {
            Some(path) => {
                debug!("Found {tool} at {}", path.display());
                false
            }
            None => {
                warn!("{tool} not found in PATH, video files will fail");
                true
            }
        })
        .collect()
}

#[must_use]
pub fn locate(tool: &str) -> Option<PathBuf> {
    which::which(tool).ok()
}
