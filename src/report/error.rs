use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing meta key in {0}")]
    MissingMeta(PathBuf),

    #[error("bad version {version} in {path}")]
    UnsupportedVersion { path: PathBuf, version: String },

    #[error("{0} looks like a summary file but has no numeric runtime version")]
    InvalidFileName(PathBuf),

    #[error("Cannot find base OS ({baseline}) for node version {major}")]
    MissingBaseline { major: u64, baseline: String },

    #[error("{os} is missing package {package}")]
    MissingPackage { os: String, package: String },

    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),
}
