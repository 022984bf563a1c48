use thiserror::Error;

use crate::entity::PackageIdentity;

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("Install of {identity} failed with exit code {exit_code}")]
    InstallFailed {
        identity: PackageIdentity,
        exit_code: i32,
    },

    #[error("Test of {identity} failed with status {status}")]
    TestFailed {
        identity: PackageIdentity,
        status: i32,
    },

    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
