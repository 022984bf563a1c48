use std::fmt;

use serde::{Deserialize, Serialize};

/// A package pinned to one version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageIdentity {
    pub name: String,
    pub version: String,
}

impl PackageIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse `name@version` or `@scope/name@version`
    pub fn parse(spec: &str) -> Option<Self> {
        let (name, version) = spec.rsplit_once('@')?;
        if name.is_empty() || version.is_empty() {
            return None;
        }
        Some(Self::new(name, version))
    }

    /// Name part of a dependency spec, with or without a version
    pub fn name_of(spec: &str) -> &str {
        match spec.rsplit_once('@') {
            Some((name, _)) if !name.is_empty() => name,
            _ => spec,
        }
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
