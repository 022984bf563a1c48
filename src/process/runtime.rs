//! Host runtime version detection

use std::path::Path;

use tracing::warn;

use crate::process::runner::{Invocation, ProcessRunner};

/// Ask the runtime for its version (`node --version` -> `20.11.0`)
pub async fn detect_runtime_version(
    runner: &dyn ProcessRunner,
    command: &str,
    working_dir: &Path,
) -> Option<String> {
    let invocation = Invocation::new(
        command,
        vec!["--version".to_string()],
        working_dir.to_path_buf(),
    );
    match runner.run(&invocation).await {
        Ok(output) if output.success() => {
            let version = output.stdout.trim();
            let version = version.strip_prefix('v').unwrap_or(version);
            (!version.is_empty()).then(|| version.to_string())
        }
        Ok(output) => {
            warn!("`{}` exited with {}", invocation.command_line(), output.exit_code);
            None
        }
        Err(e) => {
            warn!("Failed to run `{}`: {}", invocation.command_line(), e);
            None
        }
    }
}
