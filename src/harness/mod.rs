//! Self-check and JSON plumbing behind the `simd_calc` binary

pub mod config;
pub mod input;
pub mod verify;

use thiserror::Error;

use crate::core::KernelError;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Reads and deserializes a JSON file
pub fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<T, HarnessError> {
    let text = std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| HarnessError::Json {
        path: path.display().to_string(),
        source,
    })
}
