//! Try-on settings with persistence
//!
//! Settings are saved to `~/.config/tryon/settings.toml`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tryon_fit::{FitConstants, UserAdjust};

/// All try-on settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TryOnSettings {
    pub general: GeneralSettings,
    /// Fit tuning; defaults are the empirically tuned values
    pub fit: FitConstants,
    /// Last manual adjustment, restored on start
    pub adjust: UserAdjust,
}

impl TryOnSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tryon"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load settings from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };

        let path = dir.join("settings.toml");
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a specific file, creating its directory
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Logging and asset location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Maximum log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Directory accessory ids are resolved against
    pub asset_dir: PathBuf,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            asset_dir: PathBuf::from("."),
        }
    }
}

impl GeneralSettings {
    pub fn level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = TryOnSettings::default();
        assert_eq!(settings.general.level(), tracing::Level::INFO);
        assert_eq!(settings.fit, FitConstants::default());
        assert_eq!(settings.adjust, UserAdjust::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: TryOnSettings = toml::from_str(
            r#"
            [general]
            log_level = "debug"

            [fit]
            crown_factor = 0.25

            [adjust]
            scale = 1.2
            "#,
        )
        .unwrap();
        assert_eq!(settings.general.level(), tracing::Level::DEBUG);
        assert_eq!(settings.general.asset_dir, PathBuf::from("."));
        assert_eq!(settings.fit.crown_factor, 0.25);
        assert_eq!(settings.fit.width_expansion_factor, 1.8);
        assert_eq!(settings.adjust.scale, 1.2);
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let mut settings = TryOnSettings::default();
        settings.adjust.adjust_scale(0.1);
        settings.save_to(&path).unwrap();

        let loaded = TryOnSettings::load_from(&path);
        assert_eq!(loaded.adjust, settings.adjust);
        assert_eq!(loaded.fit, settings.fit);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "this is = = not toml").unwrap();

        let loaded = TryOnSettings::load_from(&path);
        assert_eq!(loaded.adjust, UserAdjust::default());
    }
}
