//! Grouping summaries by major runtime version

use std::collections::BTreeMap;

use tracing::debug;

use crate::report::coalesce::coalesce;
use crate::report::files::LoadedSummary;
use crate::report::ranges::fold_over_skips;

/// Summaries sharing one major runtime version, ordered by (OS, timestamp)
#[derive(Debug, Clone)]
pub struct Group {
    pub major: u64,
    pub members: Vec<LoadedSummary>,
}

/// Partition into ascending major-version groups, keeping member order
pub fn group_by_major(summaries: Vec<LoadedSummary>) -> Vec<Group> {
    let mut groups: BTreeMap<u64, Vec<LoadedSummary>> = BTreeMap::new();
    for summary in summaries {
        groups.entry(summary.file.major).or_default().push(summary);
    }
    groups
        .into_iter()
        .map(|(major, members)| Group { major, members })
        .collect()
}

impl Group {
    /// Collapse adjacent same-OS records into one: later meta fields and
    /// later packages win
    pub fn merge_duplicates(&mut self) {
        let members = std::mem::take(&mut self.members);
        self.members = coalesce(
            members,
            |previous, next| previous.file.os == next.file.os,
            |previous, next| {
                debug!(
                    "Merging {} into {}",
                    next.file.path.display(),
                    previous.file.path.display()
                );
                previous.file.overlay(next.file);
                previous.summary.meta.overlay(next.summary.meta);
                previous.summary.packages.extend(next.summary.packages);
            },
        );
    }

    /// Replace every package's ranges with their skip-folded form
    pub fn fold_over_skips(&mut self) {
        for member in &mut self.members {
            for package in member.summary.packages.values_mut() {
                package.ranges = fold_over_skips(&package.ranges);
            }
        }
    }
}
