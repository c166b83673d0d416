use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::catalog::{CatalogSource, DEFAULT_SOURCE};
use crate::error::ConfigError;
use crate::export::{CanvasSpec, DEFAULT_FILE_NAME, MAX_PIXEL_SIDE, TimeLabels};
use crate::selection::CollapsePolicy;

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "livelog.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// File path or http(s) URL of the tour document
    pub source: String,
    pub output: PathBuf,
    pub font: Option<PathBuf>,
    pub canvas: CanvasSpec,
    pub labels: TimeLabels,
    pub collapse_on_uncheck: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            output: PathBuf::from(DEFAULT_FILE_NAME),
            font: None,
            canvas: CanvasSpec::default(),
            labels: TimeLabels::default(),
            collapse_on_uncheck: false,
        }
    }
}

impl AppConfig {
    /// Read `path`, or `livelog.toml` if it exists, or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| ConfigError::Toml {
            path: path.clone(),
            source,
        })?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject canvas sizes that cannot be rasterized
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.canvas.pixel_size() {
            Some(_) => Ok(()),
            None => Err(ConfigError::Canvas {
                width: self.canvas.width,
                height: self.canvas.height,
                scale: self.canvas.scale,
                max: MAX_PIXEL_SIDE,
            }),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn source(&self) -> CatalogSource {
        CatalogSource::parse(&self.source)
    }

    pub fn collapse_policy(&self) -> CollapsePolicy {
        if self.collapse_on_uncheck {
            CollapsePolicy::Collapse
        } else {
            CollapsePolicy::KeepOpen
        }
    }
}
