//! Persisted summary records

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::SUMMARY_VERSION;
use crate::report::error::ReportError;

/// Outcome shared by every version of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeKey {
    Pass,
    Fail,
    Skip,
}

impl RangeKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeKey::Pass => "pass",
            RangeKey::Fail => "fail",
            RangeKey::Skip => "skip",
        }
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous run of versions sharing one outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub key: RangeKey,
    pub first: String,
    pub last: String,
    pub count: u64,
    #[serde(default, alias = "_items")]
    pub raw_items: Vec<serde_json::Value>,
}

impl Range {
    /// A one-version range
    pub fn single(key: RangeKey, version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            key,
            first: version.clone(),
            last: version.clone(),
            count: 1,
            raw_items: vec![serde_json::Value::String(version)],
        }
    }

    /// Extend this range with the one that follows it
    pub fn absorb(&mut self, next: Range) {
        self.last = next.last;
        self.count += next.count;
        self.raw_items.extend(next.raw_items);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSummary {
    #[serde(default)]
    pub latest: String,
    #[serde(default)]
    pub ranges: Vec<Range>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsInfo {
    pub id: String,
    #[serde(alias = "version_id")]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Meta {
    pub summary_version: u32,
    pub package: String,
    pub version: String,
    pub commit: String,
    pub branch: String,
    /// Runtime version the run used
    pub node: String,
    #[serde(alias = "linux")]
    pub os: OsInfo,
    pub timestamp: String,
    /// Milliseconds since the epoch
    pub start_time: i64,
    pub end_time: i64,
    pub versions: serde_json::Value,
}

fn overlay_str(target: &mut String, later: String) {
    if !later.is_empty() {
        *target = later;
    }
}

impl Meta {
    /// Field-wise overlay where every field present in `later` wins
    pub fn overlay(&mut self, later: Meta) {
        if later.summary_version != 0 {
            self.summary_version = later.summary_version;
        }
        overlay_str(&mut self.package, later.package);
        overlay_str(&mut self.version, later.version);
        overlay_str(&mut self.commit, later.commit);
        overlay_str(&mut self.branch, later.branch);
        overlay_str(&mut self.node, later.node);
        overlay_str(&mut self.os.id, later.os.id);
        overlay_str(&mut self.os.version, later.os.version);
        overlay_str(&mut self.timestamp, later.timestamp);
        if later.start_time != 0 {
            self.start_time = later.start_time;
        }
        if later.end_time != 0 {
            self.end_time = later.end_time;
        }
        if !later.versions.is_null() {
            self.versions = later.versions;
        }
    }

    /// `versions` as printed in the report
    pub fn versions_text(&self) -> String {
        match &self.versions {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Wall-clock duration of the run as `HH:MM:SS`
    pub fn elapsed(&self) -> String {
        chrono::DateTime::from_timestamp_millis((self.end_time - self.start_time).max(0))
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "00:00:00".to_string())
    }
}

/// One run's results: which versions of each package passed, failed or were skipped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub meta: Meta,
    pub packages: IndexMap<String, PackageSummary>,
}

#[derive(Deserialize)]
struct SummaryDocument {
    meta: Option<serde_json::Value>,
    #[serde(default)]
    packages: IndexMap<String, PackageSummary>,
}

impl Summary {
    /// Parse and validate a summary file's content; `path` is only used in errors
    pub fn parse(content: &str, path: &Path) -> Result<Self, ReportError> {
        let json_error = |source| ReportError::Json {
            path: path.to_path_buf(),
            source,
        };
        let document: SummaryDocument = serde_json::from_str(content).map_err(json_error)?;

        let Some(meta) = document.meta else {
            return Err(ReportError::MissingMeta(path.to_path_buf()));
        };
        let version = meta.get("summaryVersion");
        if version.and_then(|v| v.as_u64()) != Some(u64::from(SUMMARY_VERSION)) {
            return Err(ReportError::UnsupportedVersion {
                path: path.to_path_buf(),
                version: version.map_or_else(|| "undefined".to_string(), |v| v.to_string()),
            });
        }

        Ok(Self {
            meta: serde_json::from_value(meta).map_err(json_error)?,
            packages: document.packages,
        })
    }
}
