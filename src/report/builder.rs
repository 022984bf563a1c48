//! Turning sequencer results into a persisted summary

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::config::SUMMARY_VERSION;
use crate::entity::{Entity, Status};
use crate::report::coalesce::coalesce;
use crate::report::error::ReportError;
use crate::report::summary::{Meta, OsInfo, PackageSummary, Range, RangeKey, Summary};
use crate::sequencer::VersionSpec;

pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Identity of the package under test, as given on the command line
#[derive(Debug, Clone, Default)]
pub struct RunInfo {
    pub package: String,
    pub version: String,
    pub commit: String,
    pub branch: String,
}

/// `ID` and `VERSION_ID` from an os-release file
pub fn parse_os_release(content: &str) -> OsInfo {
    let mut os = OsInfo::default();
    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
        match key.trim() {
            "ID" => os.id = value,
            "VERSION_ID" => os.version = value,
            _ => {}
        }
    }
    os
}

/// Host OS; falls back to the compile-time OS name when os-release is unreadable
pub async fn detect_os() -> OsInfo {
    let mut os = match tokio::fs::read_to_string(OS_RELEASE_PATH).await {
        Ok(content) => parse_os_release(&content),
        Err(e) => {
            warn!("Failed to read {}: {}", OS_RELEASE_PATH, e);
            OsInfo::default()
        }
    };
    if os.id.is_empty() {
        os.id = std::env::consts::OS.to_string();
    }
    if os.version.is_empty() {
        os.version = "unknown".to_string();
    }
    os
}

fn outcome(entity: &Entity) -> RangeKey {
    if entity.skip {
        RangeKey::Skip
    } else if entity.test_status() == Some(Status::Pass) {
        RangeKey::Pass
    } else {
        RangeKey::Fail
    }
}

/// Coalesce per-version outcomes into ranges, in tested order
pub fn package_summary(entities: &[Entity]) -> PackageSummary {
    let ranges = coalesce(
        entities
            .iter()
            .map(|entity| Range::single(outcome(entity), entity.version())),
        |previous, next| previous.key == next.key,
        Range::absorb,
    );
    PackageSummary {
        latest: entities
            .last()
            .map(|e| e.version().to_string())
            .unwrap_or_default(),
        ranges,
    }
}

/// Collects one run's results into a `Summary`
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    info: RunInfo,
    runtime_version: String,
    os: OsInfo,
    started: DateTime<Utc>,
}

impl SummaryBuilder {
    pub fn new(info: RunInfo, runtime_version: impl Into<String>, os: OsInfo) -> Self {
        Self {
            info,
            runtime_version: runtime_version.into(),
            os,
            started: Utc::now(),
        }
    }

    /// Override the start time (defaults to construction time)
    pub fn started_at(mut self, started: DateTime<Utc>) -> Self {
        self.started = started;
        self
    }

    pub fn build(&self, specs: &[VersionSpec], finished: DateTime<Utc>) -> Summary {
        let mut packages = IndexMap::new();
        for spec in specs {
            packages.insert(spec.name.clone(), package_summary(&spec.results));
        }

        Summary {
            meta: Meta {
                summary_version: SUMMARY_VERSION,
                package: self.info.package.clone(),
                version: self.info.version.clone(),
                commit: self.info.commit.clone(),
                branch: self.info.branch.clone(),
                node: self.runtime_version.clone(),
                os: self.os.clone(),
                timestamp: finished.to_rfc3339(),
                start_time: self.started.timestamp_millis(),
                end_time: finished.timestamp_millis(),
                versions: serde_json::json!({ "node": self.runtime_version }),
            },
            packages,
        }
    }

    /// `<os-id>-<os-version>-node-v<runtime>-summary-<timestamp>.json`
    pub fn file_name(&self, finished: DateTime<Utc>) -> String {
        format!(
            "{}-{}-node-v{}-summary-{}.json",
            self.os.id,
            self.os.version,
            self.runtime_version,
            finished.format("%Y%m%dT%H%M%S")
        )
    }

    /// Build and write the summary into `dir`
    pub async fn write(
        &self,
        dir: &Path,
        specs: &[VersionSpec],
        finished: DateTime<Utc>,
    ) -> Result<PathBuf, ReportError> {
        let path = dir.join(self.file_name(finished));
        let summary = self.build(specs, finished);
        let content = serde_json::to_string_pretty(&summary).map_err(|source| ReportError::Json {
            path: path.clone(),
            source,
        })?;

        let io_error = |source| ReportError::Io {
            path: path.clone(),
            source,
        };
        tokio::fs::create_dir_all(dir).await.map_err(io_error)?;
        let mut file = tokio::fs::File::create(&path).await.map_err(io_error)?;
        file.write_all(content.as_bytes()).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;

        info!("Wrote summary {}", path.display());
        Ok(path)
    }
}
