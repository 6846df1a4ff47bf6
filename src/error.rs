//! Application error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors loading or interpreting the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unknown mode \"{0}\" (expected blender, gimp, fallback or mini-fallback)")]
    UnknownMode(String),

    #[error("Invalid {field} pattern in rule for \"{mode}\": {source}")]
    Pattern {
        mode: String,
        field: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Errors rasterizing panel content
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to load icon {path}: {source}")]
    Icon {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// A status payload that could not be decoded
#[derive(Error, Debug)]
pub enum StatusError {
    #[error("Request body not received within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Reading request body failed: {0}")]
    Body(#[from] axum::Error),

    #[error("Request body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
