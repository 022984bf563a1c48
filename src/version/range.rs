//! npm version range grammar
//!
//! A range is parsed into a disjunction of comparator sets, the same shape npm
//! itself uses: `^1.2.3 || >=2.0.0 <2.4` becomes
//! `[[>=1.2.3, <2.0.0-0], [>=2.0.0, <2.4.0]]`. Caret, tilde, X-ranges and hyphen
//! ranges are desugared into plain comparators at parse time so that
//! satisfaction is a flat scan.
//!
//! Supported syntax:
//! - `1.2.3`, `=1.2.3`, `v1.2.3` - exact match
//! - `^1.2.3`, `~1.2.3` - caret and tilde ranges, including partial forms (`^0.14`, `~1`)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators, optionally
//!   followed by whitespace (`<= 4.10.1 >= 4.10.0`)
//! - `1.2.x`, `1.x`, `1`, `*`, `""` - X-ranges
//! - `1.0.0 - 2.0.0` - hyphen ranges
//! - space-separated AND, `||`-separated OR

use std::fmt;
use std::str::FromStr;

use semver::{Prerelease, Version};

use crate::version::semver::{PartialVersion, parse_version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    fn test(&self, version: &Version) -> bool {
        match self.op {
            Op::Eq => version == &self.version,
            Op::Gt => version > &self.version,
            Op::Gte => version >= &self.version,
            Op::Lt => version < &self.version,
            Op::Lte => version <= &self.version,
        }
    }
}

/// Upper bound that excludes every prerelease of `major.minor.patch` too
fn exclusive_upper(major: u64, minor: u64, patch: u64) -> Version {
    let mut upper = Version::new(major, minor, patch);
    upper.pre = Prerelease::new("0").unwrap_or(Prerelease::EMPTY);
    upper
}

/// Error returned when a range string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid version range: {0:?}")]
pub struct RangeParseError(pub String);

/// A parsed npm range: OR of AND-sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    sets: Vec<Vec<Comparator>>,
}

impl VersionRange {
    /// Parse an npm range expression
    pub fn parse(range: &str) -> Result<Self, RangeParseError> {
        let sets = range
            .split("||")
            .map(|alternative| {
                parse_set(alternative).ok_or_else(|| RangeParseError(range.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sets })
    }

    /// Whether `version` satisfies any comparator set of this range
    pub fn satisfies(&self, version: &Version) -> bool {
        self.sets.iter().any(|set| set_satisfies(set, version))
    }

    /// Convenience for string versions; unparseable versions never satisfy
    pub fn satisfies_str(&self, version: &str) -> bool {
        parse_version(version).is_some_and(|v| self.satisfies(&v))
    }
}

impl FromStr for VersionRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Op::Eq => "",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
        };
        f.write_str(op)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sets: Vec<String> = self
            .sets
            .iter()
            .map(|set| {
                if set.is_empty() {
                    return "*".to_string();
                }
                set.iter()
                    .map(|c| format!("{}{}", c.op, c.version))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        f.write_str(&sets.join(" || "))
    }
}

fn set_satisfies(set: &[Comparator], version: &Version) -> bool {
    if !set.iter().all(|c| c.test(version)) {
        return false;
    }
    if version.pre.is_empty() {
        return true;
    }
    // A prerelease only matches when some comparator opts in on the same tuple
    set.iter().any(|c| {
        !c.version.pre.is_empty()
            && c.version.pre.as_str() != "0"
            && c.version.major == version.major
            && c.version.minor == version.minor
            && c.version.patch == version.patch
    })
}

/// Split one `||` alternative into tokens, gluing bare operators to their operand
fn tokenize(alternative: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;

    for word in alternative.split_whitespace() {
        if matches!(word, ">" | ">=" | "<" | "<=" | "=" | "^" | "~" | "~>") {
            pending_op = Some(word);
            continue;
        }
        match pending_op.take() {
            Some(op) => tokens.push(format!("{op}{word}")),
            None => tokens.push(word.to_string()),
        }
    }
    if let Some(op) = pending_op {
        tokens.push(op.to_string());
    }
    tokens
}

fn parse_set(alternative: &str) -> Option<Vec<Comparator>> {
    let tokens = tokenize(alternative);

    // `a - b`
    if let [from, dash, to] = tokens.as_slice()
        && dash == "-"
    {
        return hyphen(from, to);
    }

    let mut set = Vec::new();
    for token in &tokens {
        set.extend(desugar(token)?);
    }
    Some(set)
}

fn hyphen(from: &str, to: &str) -> Option<Vec<Comparator>> {
    let from = PartialVersion::parse(from)?;
    let to = PartialVersion::parse(to)?;
    let mut set = Vec::new();
    if from.major.is_some() {
        set.push(Comparator::new(Op::Gte, from.floor()));
    }
    set.extend(upper_inclusive(&to)?);
    Some(set)
}

/// `<=` against a partial version: `<=1.2` means `<1.3.0-0`.
///
/// `None` when the bound cannot be represented.
fn upper_inclusive(p: &PartialVersion) -> Option<Vec<Comparator>> {
    Some(match (p.major, p.minor, p.patch) {
        (None, _, _) => Vec::new(),
        (Some(major), None, _) => vec![Comparator::new(
            Op::Lt,
            exclusive_upper(major.checked_add(1)?, 0, 0),
        )],
        (Some(major), Some(minor), None) => vec![Comparator::new(
            Op::Lt,
            exclusive_upper(major, minor.checked_add(1)?, 0),
        )],
        _ => vec![Comparator::new(Op::Lte, p.floor())],
    })
}

/// X-range: `1.2` means `>=1.2.0 <1.3.0-0`
fn x_range(p: &PartialVersion) -> Option<Vec<Comparator>> {
    if p.is_full() {
        return Some(vec![Comparator::new(Op::Eq, p.floor())]);
    }
    let mut set = Vec::new();
    if p.major.is_some() {
        set.push(Comparator::new(Op::Gte, p.floor()));
    }
    set.extend(upper_inclusive(p)?);
    Some(set)
}

fn caret(p: &PartialVersion) -> Option<Vec<Comparator>> {
    let Some(major) = p.major else {
        return Some(Vec::new());
    };
    let upper = match (major, p.minor, p.patch) {
        (0, Some(0), Some(patch)) => exclusive_upper(0, 0, patch.checked_add(1)?),
        (0, Some(minor), _) => exclusive_upper(0, minor.checked_add(1)?, 0),
        (major, _, _) => exclusive_upper(major.checked_add(1)?, 0, 0),
    };
    Some(vec![
        Comparator::new(Op::Gte, p.floor()),
        Comparator::new(Op::Lt, upper),
    ])
}

fn tilde(p: &PartialVersion) -> Option<Vec<Comparator>> {
    let Some(major) = p.major else {
        return Some(Vec::new());
    };
    let upper = match p.minor {
        Some(minor) => exclusive_upper(major, minor.checked_add(1)?, 0),
        None => exclusive_upper(major.checked_add(1)?, 0, 0),
    };
    Some(vec![
        Comparator::new(Op::Gte, p.floor()),
        Comparator::new(Op::Lt, upper),
    ])
}

fn desugar(token: &str) -> Option<Vec<Comparator>> {
    if let Some(rest) = token.strip_prefix(">=") {
        let p = PartialVersion::parse(rest)?;
        return Some(match p.major {
            None => Vec::new(),
            Some(_) => vec![Comparator::new(Op::Gte, p.floor())],
        });
    }
    if let Some(rest) = token.strip_prefix("<=") {
        return upper_inclusive(&PartialVersion::parse(rest)?);
    }
    if let Some(rest) = token.strip_prefix('>') {
        let p = PartialVersion::parse(rest)?;
        return Some(match (p.major, p.minor, p.patch) {
            // >* can never match
            (None, _, _) => vec![Comparator::new(Op::Lt, Version::new(0, 0, 0))],
            (Some(major), None, _) => vec![Comparator::new(
                Op::Gte,
                Version::new(major.checked_add(1)?, 0, 0),
            )],
            (Some(major), Some(minor), None) => vec![Comparator::new(
                Op::Gte,
                Version::new(major, minor.checked_add(1)?, 0),
            )],
            _ => vec![Comparator::new(Op::Gt, p.floor())],
        });
    }
    if let Some(rest) = token.strip_prefix('<') {
        let p = PartialVersion::parse(rest)?;
        return Some(match p.major {
            None => vec![Comparator::new(Op::Lt, Version::new(0, 0, 0))],
            Some(_) => vec![Comparator::new(Op::Lt, p.floor())],
        });
    }
    if let Some(rest) = token.strip_prefix('^') {
        return caret(&PartialVersion::parse(rest)?);
    }
    if let Some(rest) = token.strip_prefix("~>").or_else(|| token.strip_prefix('~')) {
        return tilde(&PartialVersion::parse(rest)?);
    }
    x_range(&PartialVersion::parse(token)?)
}
