//! Process execution layer
//!
//! - [`runner`]: `ProcessRunner` trait and the tokio-backed `CommandRunner`
//! - [`package_manager`]: builds install/uninstall invocations for the shared install location
//! - [`runtime`]: host runtime version detection

pub mod package_manager;
pub mod runner;
pub mod runtime;

pub use package_manager::PackageManager;
pub use runner::{CommandRunner, Invocation, OutputMode, ProcessOutput, ProcessRunner};
pub use runtime::detect_runtime_version;
