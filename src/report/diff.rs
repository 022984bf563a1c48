//! Cross-environment differencing against a baseline OS

use indexmap::{IndexMap, IndexSet};

use crate::report::error::ReportError;
use crate::report::grouping::Group;
use crate::report::ranges::{pass_text, ranges_equal};

/// Supported-version text per package for one major runtime version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDiff {
    pub major: u64,
    /// Runtime version of the baseline run
    pub node: String,
    pub base_os: String,
    pub others: Vec<String>,
    /// Baseline pass ranges, with ` (<os>: <ranges>)` appended per differing OS
    pub supported: IndexMap<String, String>,
    /// Packages whose ranges differ in at least one other OS
    pub differences: IndexSet<String>,
}

/// Compare every member of `group` against the one whose OS id is `baseline_os`
pub fn diff_group(group: &Group, baseline_os: &str) -> Result<GroupDiff, ReportError> {
    let (bases, others): (Vec<_>, Vec<_>) = group
        .members
        .iter()
        .partition(|m| m.summary.meta.os.id == baseline_os);

    // with duplicates kept, the latest baseline run wins
    let Some(base) = bases.last() else {
        return Err(ReportError::MissingBaseline {
            major: group.major,
            baseline: baseline_os.to_string(),
        });
    };

    let mut supported = IndexMap::new();
    let mut differences = IndexSet::new();

    for (name, package) in &base.summary.packages {
        let mut text = pass_text(&package.ranges);

        for other in &others {
            let os = &other.summary.meta.os.id;
            let Some(other_package) = other.summary.packages.get(name) else {
                return Err(ReportError::MissingPackage {
                    os: os.clone(),
                    package: name.clone(),
                });
            };

            if !ranges_equal(&package.ranges, &other_package.ranges) {
                differences.insert(name.clone());
                let other_text = pass_text(&other_package.ranges);
                if !other_text.is_empty() {
                    text.push_str(&format!(" ({}: {})", os, other_text));
                }
            }
        }

        supported.insert(name.clone(), text);
    }

    Ok(GroupDiff {
        major: group.major,
        node: base.summary.meta.node.clone(),
        base_os: base.summary.meta.os.id.clone(),
        others: others.iter().map(|o| o.summary.meta.os.id.clone()).collect(),
        supported,
        differences,
    })
}
