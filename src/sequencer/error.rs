use std::path::PathBuf;

use thiserror::Error;

use crate::version::error::RegistryError;

#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("Unsupported version ({version}) for {name}")]
    UnsupportedSchema { name: String, version: u32 },

    #[error("Failed to fetch versions: {0}")]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No version field in {0:?}")]
    MissingVersion(PathBuf),
}
