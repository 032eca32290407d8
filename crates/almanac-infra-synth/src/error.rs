//! Synthesis error types

use almanac_infra_core::TopologyError;
use thiserror::Error;

/// Errors raised while rendering or writing a cloud assembly
#[derive(Error, Debug)]
pub enum SynthError {
    #[error("Invalid topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("Unsupported template format: {0}")]
    UnsupportedFormat(String),

    #[error("Manifest error: {0}")]
    ManifestError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SynthError>;
