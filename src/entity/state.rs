use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of an [`Entity`](crate::entity::Entity)
///
/// `Initial -> Installed | InstallFailed`, `Installed -> Tested` (composite
/// only), and any state `-> Uninstalled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityState {
    Initial,
    Installed,
    InstallFailed,
    Tested,
    Uninstalled,
}

impl EntityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityState::Initial => "initial",
            EntityState::Installed => "installed",
            EntityState::InstallFailed => "install-failed",
            EntityState::Tested => "tested",
            EntityState::Uninstalled => "uninstalled",
        }
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one install/test/uninstall step; `None` where a step never ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    pub fn from_success(success: bool) -> Self {
        if success { Status::Pass } else { Status::Fail }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
        })
    }
}
