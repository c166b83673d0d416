use std::path::PathBuf;

use thiserror::Error;

/// Failures while fetching or parsing the tour document.
/// All of them degrade the session to an empty catalog.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("malformed tour document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tour document: {0}")]
    Shape(String),
}

/// Failures of a single export attempt; the selection is never touched
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no shows selected")]
    EmptySelection,

    #[error("no background selected")]
    MissingBackground,

    #[error("rendering failed: {0:#}")]
    Render(anyhow::Error),

    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("canvas {width}x{height} at scale {scale} does not fit in {max}x{max} pixels")]
    Canvas {
        width: u32,
        height: u32,
        scale: u32,
        max: u32,
    },
}
