//! Declarative description of one dependency's version matrix

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, PackageIdentity, Task, TaskSpec};

/// Versions-file schema with a single range (or list of ranges) and no dependencies
pub const SCHEMA_V1: u32 = 1;
/// Versions-file schema with per-range dependency lists
pub const SCHEMA_V2: u32 = 2;

/// Version used for a dependency declared without one
const UNPINNED_VERSION: &str = "latest";

fn default_schema_version() -> u32 {
    SCHEMA_V1
}

/// A range string or a list of them (any may match)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeSelector {
    One(String),
    Many(Vec<String>),
}

impl RangeSelector {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            RangeSelector::One(range) => vec![range.clone()],
            RangeSelector::Many(ranges) => ranges.clone(),
        }
    }
}

/// A schema-v2 range and the dependencies installed with versions in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRange {
    pub range: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl DependencyRange {
    pub fn new(range: impl Into<String>, dependencies: Vec<&str>) -> Self {
        Self {
            range: range.into(),
            dependencies: dependencies.into_iter().map(String::from).collect(),
        }
    }

    pub fn dependency_identities(&self) -> Vec<PackageIdentity> {
        self.dependencies
            .iter()
            .map(|d| {
                PackageIdentity::parse(d)
                    .unwrap_or_else(|| PackageIdentity::new(d.as_str(), UNPINNED_VERSION))
            })
            .collect()
    }
}

/// One entry of a versions file; `results` is attached after the matrix runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskSpec>,
    #[serde(rename = "version", default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeSelector>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<DependencyRange>,
    /// In-process task; takes precedence over `task`
    #[serde(skip)]
    pub callable: Option<Task>,
    #[serde(skip)]
    pub results: Vec<Entity>,
}

impl VersionSpec {
    /// Schema-v1 spec with a single range
    pub fn v1(name: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task: None,
            schema_version: SCHEMA_V1,
            range: Some(RangeSelector::One(range.into())),
            ranges: Vec::new(),
            callable: None,
            results: Vec::new(),
        }
    }

    /// Schema-v2 spec with per-range dependencies
    pub fn v2(name: impl Into<String>, ranges: Vec<DependencyRange>) -> Self {
        Self {
            name: name.into(),
            task: None,
            schema_version: SCHEMA_V2,
            range: None,
            ranges,
            callable: None,
            results: Vec::new(),
        }
    }

    pub fn with_task(mut self, task: TaskSpec) -> Self {
        self.task = Some(task);
        self
    }

    pub fn with_callable(mut self, task: Task) -> Self {
        self.callable = Some(task);
        self
    }

    /// The task every entity of this spec runs
    pub fn resolved_task(&self) -> Option<Task> {
        self.callable
            .clone()
            .or_else(|| self.task.clone().map(Task::from))
    }

    /// Distinct dependency names across all v2 ranges, in declaration order
    pub fn dependency_names(&self) -> Vec<String> {
        self.ranges
            .iter()
            .flat_map(|r| r.dependencies.iter())
            .map(|d| PackageIdentity::name_of(d).to_string())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Parse a versions file: a JSON array of specs
pub fn parse_versions_file(content: &str) -> Result<Vec<VersionSpec>, serde_json::Error> {
    serde_json::from_str(content)
}
