//! Locating, ordering and loading summary files

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use futures::future::try_join_all;
use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, info};

use crate::report::error::ReportError;
use crate::report::summary::Summary;
use crate::version::semver::major_of;

static SUMMARY_FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+-.+)-node-v(.+)-summary-(.+)\.json$").expect("valid summary file pattern")
});

/// What a summary's file name says about the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryFile {
    pub path: PathBuf,
    /// `<os-id>-<os-version>`
    pub os: String,
    pub runtime_version: String,
    pub major: u64,
    pub timestamp: String,
}

impl SummaryFile {
    /// `Ok(None)` when the file name is not a summary file name
    pub fn from_path(path: &Path) -> Result<Option<Self>, ReportError> {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Ok(None);
        };
        let Some(caps) = SUMMARY_FILE_PATTERN.captures(name) else {
            return Ok(None);
        };

        let runtime_version = caps[2].to_string();
        let major =
            major_of(&runtime_version).ok_or_else(|| ReportError::InvalidFileName(path.into()))?;

        Ok(Some(Self {
            path: path.to_path_buf(),
            os: caps[1].to_string(),
            runtime_version,
            major,
            timestamp: caps[3].to_string(),
        }))
    }

    /// Take over the identity of a later file merged into this one
    pub fn overlay(&mut self, later: SummaryFile) {
        *self = later;
    }
}

/// A summary file together with its parsed content
#[derive(Debug, Clone)]
pub struct LoadedSummary {
    pub file: SummaryFile,
    pub summary: Summary,
}

/// Expand files and directories (one level deep) into candidate paths
pub async fn collect_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>, ReportError> {
    let mut files = Vec::new();
    for path in paths {
        let io_error = |source| ReportError::Io {
            path: path.clone(),
            source,
        };
        let metadata = tokio::fs::metadata(path).await.map_err(io_error)?;
        if metadata.is_dir() {
            let mut entries = tokio::fs::read_dir(path).await.map_err(io_error)?;
            let mut found = Vec::new();
            while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
                found.push(entry.path());
            }
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Keep summary files only, ordered by (major runtime version, OS, timestamp)
pub fn select_summary_files(paths: &[PathBuf]) -> Result<Vec<SummaryFile>, ReportError> {
    let mut files = Vec::new();
    for path in paths {
        match SummaryFile::from_path(path)? {
            Some(file) => files.push(file),
            None => debug!("Ignoring {}", path.display()),
        }
    }
    files.sort_by(|a, b| {
        (a.major, &a.os, &a.timestamp).cmp(&(b.major, &b.os, &b.timestamp))
    });
    Ok(files)
}

/// Keep only the latest file per (OS, major runtime version); `files` must be ordered
pub fn dedupe_latest(files: Vec<SummaryFile>) -> Vec<SummaryFile> {
    let mut latest: IndexMap<(String, u64), SummaryFile> = IndexMap::new();
    for file in files {
        latest.insert((file.os.clone(), file.major), file);
    }
    latest.into_values().collect()
}

pub async fn load_summary(file: SummaryFile) -> Result<LoadedSummary, ReportError> {
    let content = tokio::fs::read_to_string(&file.path)
        .await
        .map_err(|source| ReportError::Io {
            path: file.path.clone(),
            source,
        })?;
    let summary = Summary::parse(&content, &file.path)?;
    info!("Loaded {}", file.path.display());
    Ok(LoadedSummary { file, summary })
}

/// Load every file; the first invalid one aborts the whole batch
pub async fn load_summaries(files: Vec<SummaryFile>) -> Result<Vec<LoadedSummary>, ReportError> {
    try_join_all(files.into_iter().map(load_summary)).await
}
