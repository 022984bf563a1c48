use semver::{BuildMetadata, Prerelease, Version};

/// A version that may be missing trailing components or use `x`/`*` wildcards.
///
/// `1` and `1.x` both parse to `major: Some(1), minor: None, patch: None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialVersion {
    pub major: Option<u64>,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    pub pre: Prerelease,
}

impl PartialVersion {
    /// Parse `1`, `1.2`, `1.2.x`, `v1.2.3`, `=1.2.3-beta.1`, `*` and friends.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text.strip_prefix('=').unwrap_or(text).trim_start();
        let text = text
            .strip_prefix('v')
            .or_else(|| text.strip_prefix('V'))
            .unwrap_or(text);
        if text.is_empty() {
            return None;
        }

        // build metadata never takes part in matching
        let text = text.split('+').next().unwrap_or(text);
        let (core, pre) = match text.split_once('-') {
            Some((core, pre)) => (core, Prerelease::new(pre).ok()?),
            None => (text, Prerelease::EMPTY),
        };

        let mut parts = core.split('.');
        let major = wildcard_or_number(parts.next()?)?;
        let minor = parts.next().map(wildcard_or_number).unwrap_or(Some(None))?;
        let patch = parts.next().map(wildcard_or_number).unwrap_or(Some(None))?;
        if parts.next().is_some() {
            return None;
        }

        // 1.x.3 is not meaningful
        if (major.is_none() && (minor.is_some() || patch.is_some()))
            || (minor.is_none() && patch.is_some())
        {
            return None;
        }

        Some(Self {
            major,
            minor,
            patch,
            pre,
        })
    }

    /// Whether every component is present
    pub fn is_full(&self) -> bool {
        self.patch.is_some()
    }

    /// Fill the missing components with zeros
    pub fn floor(&self) -> Version {
        Version {
            major: self.major.unwrap_or(0),
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            pre: self.pre.clone(),
            build: BuildMetadata::EMPTY,
        }
    }
}

fn wildcard_or_number(part: &str) -> Option<Option<u64>> {
    match part {
        "x" | "X" | "*" => Some(None),
        n => n.parse::<u64>().ok().map(Some),
    }
}

/// Parse a concrete version, ignoring a leading `v` and any build metadata.
pub fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    let mut parsed = Version::parse(version).ok()?;
    parsed.build = BuildMetadata::EMPTY;
    Some(parsed)
}

/// Major component of a runtime version such as `v18.19.0` or `20.1.0`.
pub fn major_of(version: &str) -> Option<u64> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    version.split('.').next()?.parse().ok()
}
