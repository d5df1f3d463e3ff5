use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::domain::edges::EdgeThresholds;
use crate::detection::domain::detection_params::DetectionParams;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Tunable detector parameters. Missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub face: DetectionParams,
    pub eyes: DetectionParams,
    pub smile_primary: DetectionParams,
    pub smile_secondary: DetectionParams,
    pub edges: EdgeThresholds,
    pub equalize_histogram: bool,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            face: DetectionParams::FACE,
            eyes: DetectionParams::EYES,
            smile_primary: DetectionParams::SMILE_PRIMARY,
            smile_secondary: DetectionParams::SMILE_SECONDARY,
            edges: EdgeThresholds::default(),
            equalize_histogram: true,
        }
    }
}

impl DetectorSettings {
    /// `<config dir>/FaceMood/settings.json`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceMood").join("settings.json"))
    }

    /// Reads the user config file, or the defaults if there is none.
    pub fn load() -> Result<Self, SettingsError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source: std::io::Error| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, self.to_json()?).map_err(io_err)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let passes = [
            ("face", &self.face),
            ("eyes", &self.eyes),
            ("smile_primary", &self.smile_primary),
            ("smile_secondary", &self.smile_secondary),
        ];
        for (name, p) in passes {
            if p.scale_factor <= 1.0 {
                return Err(SettingsError::Invalid(format!(
                    "{name}.scale_factor must be greater than 1, got {}",
                    p.scale_factor
                )));
            }
        }
        if self.edges.low > self.edges.high {
            return Err(SettingsError::Invalid(format!(
                "edges.low ({}) exceeds edges.high ({})",
                self.edges.low, self.edges.high
            )));
        }
        Ok(())
    }
}
