use crate::config::types::{Config, UserSettings};
use crate::tools::{ensure_directory_exists, validate_directory_exists};
use anyhow::{Context, Result, bail};
use log::{info, warn};
use std::fs;
use std::path::Path;

impl Config {
    /// Reads the settings file; a missing file falls back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = if path.exists() {
            Self::load_settings(path)?
        } else {
            warn!(
                "Settings file {} not found, using defaults",
                path.display()
            );
            UserSettings::default()
        };

        Ok(Self { settings })
    }

    #[must_use]
    pub const fn from_settings(settings: UserSettings) -> Self {
        Self { settings }
    }

    fn load_settings(path: &Path) -> Result<UserSettings> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }

    /// Checks required values and creates the done/temp directories.
    pub fn validate(&self) -> Result<()> {
        let settings = &self.settings;

        if settings.chat_id == 0 {
            bail!("chat_id is required");
        }
        if settings.grid_columns == 0 || settings.grid_rows == 0 {
            bail!(
                "invalid grid dimensions: {}x{}",
                settings.grid_columns,
                settings.grid_rows
            );
        }

        validate_directory_exists(&settings.source_dir)
            .context("source_dir must be an existing directory")?;
        ensure_directory_exists(&settings.done_dir)
            .with_context(|| format!("Failed to create done_dir {}", settings.done_dir.display()))?;
        ensure_directory_exists(&settings.temp_dir)
            .with_context(|| format!("Failed to create temp_dir {}", settings.temp_dir.display()))?;

        info!(
            "Settings: source={}, done={}, temp={}, max_size={}",
            settings.source_dir.display(),
            settings.done_dir.display(),
            settings.temp_dir.display(),
            settings.max_size
        );

        Ok(())
    }
}
