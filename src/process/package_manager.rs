//! Install/uninstall command builder for the shared install location

use std::path::Path;

use crate::entity::PackageIdentity;
use crate::process::runner::Invocation;

/// Default package manager program
pub const DEFAULT_PACKAGE_MANAGER: &str = "npm";

/// Builds package manager invocations
///
/// Installs never touch the manifest (`--no-save`): the harness swaps versions
/// in and out of the install location and restores the original afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManager {
    program: String,
}

impl PackageManager {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Install `target` pinned to its exact version together with its dependencies
    pub fn install(
        &self,
        target: &PackageIdentity,
        dependencies: &[PackageIdentity],
        working_dir: &Path,
    ) -> Invocation {
        let mut args = vec!["install".to_string(), "--no-save".to_string()];
        args.push(target.to_string());
        args.extend(dependencies.iter().map(PackageIdentity::to_string));
        Invocation::new(self.program.clone(), args, working_dir.to_path_buf())
    }

    /// Remove `name` from the install location
    pub fn uninstall(&self, name: &str, working_dir: &Path) -> Invocation {
        Invocation::new(
            self.program.clone(),
            vec![
                "uninstall".to_string(),
                "--no-save".to_string(),
                name.to_string(),
            ],
            working_dir.to_path_buf(),
        )
    }
}

impl Default for PackageManager {
    fn default() -> Self {
        Self::new(DEFAULT_PACKAGE_MANAGER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn install_pins_target_and_dependencies() {
        let pm = PackageManager::default();
        let invocation = pm.install(
            &PackageIdentity::new("mongodb-core", "3.1.0"),
            &[PackageIdentity::new("@types/bson", "1.0.0")],
            Path::new("/work"),
        );

        assert_eq!(
            invocation.command_line(),
            "npm install --no-save mongodb-core@3.1.0 @types/bson@1.0.0"
        );
        assert_eq!(invocation.working_dir, PathBuf::from("/work"));
    }

    #[test]
    fn uninstall_removes_by_name() {
        let pm = PackageManager::new("pnpm");
        let invocation = pm.uninstall("ap", Path::new("/work"));

        assert_eq!(invocation.command_line(), "pnpm uninstall --no-save ap");
    }
}
