//! Range folding, filtering and comparison

use crate::report::coalesce::coalesce;
use crate::report::summary::{Range, RangeKey};

/// `first`, or `first-last` for a multi-version range
pub fn range_text(range: &Range) -> String {
    if range.first == range.last {
        range.first.clone()
    } else {
        format!("{}-{}", range.first, range.last)
    }
}

/// Drop skip ranges and join the neighbours they separated.
///
/// Coverage of the non-skipped versions is unchanged and folding an already
/// folded list is a no-op.
pub fn fold_over_skips(ranges: &[Range]) -> Vec<Range> {
    coalesce(
        ranges.iter().filter(|r| r.key != RangeKey::Skip).cloned(),
        |previous, next| previous.key == next.key,
        Range::absorb,
    )
}

/// Equal when every aligned pair has the same key, bounds, count and raw items
pub fn ranges_equal(a: &[Range], b: &[Range]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            x.key == y.key
                && x.first == y.first
                && x.last == y.last
                && x.count == y.count
                && x.raw_items == y.raw_items
        })
}

/// Comma-separated text of the pass ranges
pub fn pass_text(ranges: &[Range]) -> String {
    ranges
        .iter()
        .filter(|r| r.key == RangeKey::Pass)
        .map(range_text)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which ranges a report shows, parsed from letters `p`, `f`, `s`, `t`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub pass: bool,
    pub fail: bool,
    pub skip: bool,
    pub trailing_fails: bool,
    /// Exactly `p`: pass ranges print abbreviated
    pass_only: bool,
}

impl Default for Filter {
    fn default() -> Self {
        Self::parse("p")
    }
}

impl Filter {
    /// Unknown letters are ignored
    pub fn parse(letters: &str) -> Self {
        Self {
            pass: letters.contains('p'),
            fail: letters.contains('f'),
            skip: letters.contains('s'),
            trailing_fails: letters.contains('t'),
            pass_only: letters == "p",
        }
    }

    pub fn includes(&self, key: RangeKey) -> bool {
        match key {
            RangeKey::Pass => self.pass,
            RangeKey::Fail => self.fail,
            RangeKey::Skip => self.skip,
        }
    }

    /// Lines for the ranges this filter shows, in order
    pub fn lines(&self, ranges: &[Range]) -> Vec<String> {
        let detailed = |r: &Range| format!("{} {} ({})", r.key, range_text(r), r.count);
        let mut lines = Vec::new();

        for (ix, range) in ranges.iter().enumerate() {
            if self.pass_only && range.key == RangeKey::Pass {
                lines.push(range_text(range));
                continue;
            }

            if self.trailing_fails && ix == ranges.len() - 1 {
                if range.key == RangeKey::Fail {
                    lines.push(detailed(range));
                    continue;
                }
                // testing stopped right after a failure; surface that failure
                if range.key == RangeKey::Skip
                    && let Some(previous) = ix.checked_sub(1).map(|p| &ranges[p])
                    && previous.key == RangeKey::Fail
                {
                    if !self.fail {
                        lines.push(detailed(previous));
                    }
                    continue;
                }
            }

            if self.includes(range.key) {
                lines.push(detailed(range));
            }
        }
        lines
    }
}
