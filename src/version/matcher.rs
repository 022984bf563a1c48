//! Range satisfaction abstraction
//!
//! The sequencer only ever asks one question of a range: does this published
//! version fall inside it. Keeping that behind a trait lets the matrix be
//! driven against registries with other range dialects.

use tracing::warn;

use crate::version::range::VersionRange;

/// Trait for range satisfaction logic
pub trait RangeMatcher: Send + Sync {
    /// Check whether `version` satisfies the range expression `range`
    ///
    /// An unparseable range or version never satisfies.
    fn satisfies(&self, version: &str, range: &str) -> bool;

    /// Check whether `version` satisfies any of `ranges`
    fn satisfies_any(&self, version: &str, ranges: &[String]) -> bool {
        ranges.iter().any(|range| self.satisfies(version, range))
    }
}

/// npm-style range matcher
#[derive(Debug, Clone, Copy, Default)]
pub struct NpmRangeMatcher;

impl RangeMatcher for NpmRangeMatcher {
    fn satisfies(&self, version: &str, range: &str) -> bool {
        match VersionRange::parse(range) {
            Ok(parsed) => parsed.satisfies_str(version),
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }
}
