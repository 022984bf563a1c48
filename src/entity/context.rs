use std::path::PathBuf;
use std::sync::Arc;

use crate::process::{OutputMode, PackageManager, ProcessRunner};

/// Everything an entity needs to act on the shared install location
#[derive(Clone)]
pub struct InstallContext {
    pub runner: Arc<dyn ProcessRunner>,
    pub package_manager: PackageManager,
    /// Directory whose `node_modules` is the shared install location
    pub working_dir: PathBuf,
    pub output: OutputMode,
}

impl InstallContext {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        package_manager: PackageManager,
        working_dir: PathBuf,
    ) -> Self {
        Self {
            runner,
            package_manager,
            working_dir,
            output: OutputMode::Capture,
        }
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }
}

impl std::fmt::Debug for InstallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallContext")
            .field("package_manager", &self.package_manager)
            .field("working_dir", &self.working_dir)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
