use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::process::package_manager::DEFAULT_PACKAGE_MANAGER;
use crate::version::registries::npm::DEFAULT_BASE_URL;

// =============================================================================
// Summary/report constants
// =============================================================================

/// The only summary file format version the report stage accepts
pub const SUMMARY_VERSION: u32 = 1;

/// OS id every other environment is compared against
pub const DEFAULT_BASELINE_OS: &str = "ubuntu";

/// Width of the `=` bars framing each runtime-version section
pub const REPORT_BAR_WIDTH: usize = 60;

/// Default host runtime executable
pub const DEFAULT_RUNTIME_COMMAND: &str = "node";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Harness configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct HarnessConfig {
    pub install: InstallConfig,
    pub runtime: RuntimeConfig,
    pub registry: RegistryConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// Shared install location settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct InstallConfig {
    pub package_manager: String,
    /// Directory holding `node_modules`; the current directory when unset
    pub working_dir: Option<PathBuf>,
    /// Capture child stdout/stderr into the entity log instead of inheriting
    pub capture_output: bool,
    /// Append child stdout/stderr to this file; wins over `capture_output`
    pub log_file: Option<PathBuf>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            package_manager: DEFAULT_PACKAGE_MANAGER.to_string(),
            working_dir: None,
            capture_output: true,
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub command: String,
    /// Overrides the version reported by `<command> --version`
    pub version: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_RUNTIME_COMMAND.to_string(),
            version: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    pub npm_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            npm_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportConfig {
    pub baseline_os: String,
    /// Where rendered template files are written
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            baseline_os: DEFAULT_BASELINE_OS.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write logs to `log_path()`
    pub file: bool,
}

impl HarnessConfig {
    /// Load from `path`, else from `config_path()` if it exists, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = config_path();
                if default_path.is_file() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Install working directory, defaulting to the current directory
    pub fn working_dir(&self) -> PathBuf {
        self.install
            .working_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Returns the path to the data directory for version-matrix.
/// Uses $XDG_DATA_HOME/version-matrix if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/version-matrix,
/// or ./version-matrix if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the default config file.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("version-matrix.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("version-matrix")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn harness_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<HarnessConfig>(json!({
            "report": {
                "baselineOs": "debian"
            }
        }))
        .unwrap();

        assert_eq!(result.report.baseline_os, "debian");
        assert_eq!(result.report.output_dir, PathBuf::from("."));
        assert_eq!(result.install, InstallConfig::default());
        assert_eq!(result.runtime.command, "node");
        assert!(!result.logging.file);
    }

    #[test]
    fn harness_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<HarnessConfig>(json!({
            "install": {
                "packageManager": "pnpm",
                "workingDir": "/srv/app",
                "captureOutput": false,
                "logFile": "/srv/app/install.log"
            },
            "runtime": { "command": "nodejs", "version": "18.19.0" },
            "registry": { "npmUrl": "http://localhost:4873" },
            "report": { "baselineOs": "alpine", "outputDir": "out" },
            "logging": { "file": true }
        }))
        .unwrap();

        assert_eq!(
            result,
            HarnessConfig {
                install: InstallConfig {
                    package_manager: "pnpm".to_string(),
                    working_dir: Some(PathBuf::from("/srv/app")),
                    capture_output: false,
                    log_file: Some(PathBuf::from("/srv/app/install.log")),
                },
                runtime: RuntimeConfig {
                    command: "nodejs".to_string(),
                    version: Some("18.19.0".to_string()),
                },
                registry: RegistryConfig {
                    npm_url: "http://localhost:4873".to_string(),
                },
                report: ReportConfig {
                    baseline_os: "alpine".to_string(),
                    output_dir: PathBuf::from("out"),
                },
                logging: LoggingConfig { file: true },
            }
        );
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"runtime": {"version": "20.0.0"}}"#).unwrap();

        let config = HarnessConfig::load(Some(&path)).unwrap();

        assert_eq!(config.runtime.version.as_deref(), Some("20.0.0"));
    }

    #[test]
    fn load_reports_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = HarnessConfig::load(Some(&path));

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn load_reports_missing_explicit_file() {
        let dir = TempDir::new().unwrap();

        let result = HarnessConfig::load(Some(&dir.path().join("absent.json")));

        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/version-matrix"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.local/share/version-matrix"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./version-matrix"));
    }
}
