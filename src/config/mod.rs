pub mod load;
pub mod size;
pub mod types;

pub use size::{format_bytes, parse_size};
pub use types::{
    Config, DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS, DEFAULT_SETTINGS_FILE, UserSettings,
};
