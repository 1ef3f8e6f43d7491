use crate::config::size::deserialize_size;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Preview grid: 5 columns x 6 rows = 30 frames
pub const DEFAULT_GRID_COLUMNS: usize = 5;
pub const DEFAULT_GRID_ROWS: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Flat directory holding `TAG_DESCRIPTION.ext` files
    pub source_dir: PathBuf,
    /// Delivered files end up here as `<stem>_msgid_<id><ext>`
    pub done_dir: PathBuf,
    /// Parent of the per-file scratch directories
    pub temp_dir: PathBuf,
    /// Root of the local outbox transport
    pub outbox_dir: PathBuf,
    pub chat_id: i64,
    /// Largest single item in bytes, 0 disables splitting
    #[serde(deserialize_with = "deserialize_size")]
    pub max_size: u64,
    /// Leave scratch directories behind for inspection
    pub keep_temp_dir: bool,
    pub grid_columns: usize,
    pub grid_rows: usize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("upload"),
            done_dir: PathBuf::from("done"),
            temp_dir: std::env::temp_dir().join("album_uploader"),
            outbox_dir: PathBuf::from("outbox"),
            chat_id: 0,
            max_size: 0,
            keep_temp_dir: false,
            grid_columns: DEFAULT_GRID_COLUMNS,
            grid_rows: DEFAULT_GRID_ROWS,
        }
    }
}

impl UserSettings {
    #[must_use]
    pub const fn frame_count(&self) -> usize {
        self.grid_columns * self.grid_rows
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: UserSettings,
}
