//! A fake package manager backed by a real `node_modules` directory
//!
//! `npm install --no-save name@ver ...` writes `node_modules/<name>/package.json`,
//! `npm uninstall --no-save name` removes the directory. Anything else is
//! treated as a test command, which fails while a configured version is installed.
//!
//! With a latency set, every command sleeps while it is counted as in flight,
//! so overlapping commands from concurrent futures become observable.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use version_matrix::entity::{InstallContext, PackageIdentity};
use version_matrix::process::{Invocation, PackageManager, ProcessOutput, ProcessRunner};

use super::registry::MockRegistry;

#[derive(Default)]
struct Activity {
    running: usize,
    peak: usize,
    running_by_name: HashMap<String, usize>,
    peak_by_name: HashMap<String, usize>,
}

pub struct FakePackageManager {
    root: TempDir,
    registry: Arc<MockRegistry>,
    failing: Mutex<HashSet<PackageIdentity>>,
    history: Mutex<Vec<String>>,
    latency: Duration,
    activity: Mutex<Activity>,
}

impl FakePackageManager {
    pub fn new(registry: Arc<MockRegistry>) -> Self {
        Self {
            root: TempDir::new().unwrap(),
            registry,
            failing: Mutex::new(HashSet::new()),
            history: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
            activity: Mutex::new(Activity::default()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Most commands ever running at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.activity.lock().unwrap().peak
    }

    /// Most install/uninstall commands naming `name` ever running at the same time
    pub fn peak_concurrency_of(&self, name: &str) -> usize {
        self.activity
            .lock()
            .unwrap()
            .peak_by_name
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    fn enter(&self, names: &[String]) {
        let mut activity = self.activity.lock().unwrap();
        activity.running += 1;
        activity.peak = activity.peak.max(activity.running);
        for name in names {
            let running = activity.running_by_name.entry(name.clone()).or_default();
            *running += 1;
            let running = *running;
            let peak = activity.peak_by_name.entry(name.clone()).or_default();
            *peak = (*peak).max(running);
        }
    }

    fn leave(&self, names: &[String]) {
        let mut activity = self.activity.lock().unwrap();
        activity.running -= 1;
        for name in names {
            if let Some(running) = activity.running_by_name.get_mut(name) {
                *running -= 1;
            }
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Make test commands fail while `name@version` is installed
    pub fn fail_tests_with(&self, name: &str, version: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(PackageIdentity::new(name, version));
    }

    /// Put `name@version` in place without recording it in the history
    pub fn preinstall(&self, name: &str, version: &str) {
        write_manifest(self.root(), &PackageIdentity::new(name, version));
    }

    pub fn installed_version(&self, name: &str) -> Option<String> {
        let content = std::fs::read_to_string(manifest_path(self.root(), name)).ok()?;
        let manifest: serde_json::Value = serde_json::from_str(&content).ok()?;
        manifest["version"].as_str().map(str::to_string)
    }

    /// Every command line run so far
    pub fn history(&self) -> Vec<String> {
        self.history.lock().unwrap().clone()
    }

    pub fn context(self: &Arc<Self>) -> Arc<InstallContext> {
        Arc::new(InstallContext::new(
            self.clone(),
            PackageManager::default(),
            self.root().to_path_buf(),
        ))
    }

    fn install(&self, specs: &[String]) -> ProcessOutput {
        let identities: Vec<PackageIdentity> = specs
            .iter()
            .filter_map(|spec| PackageIdentity::parse(spec))
            .collect();
        for identity in &identities {
            let published = identity.version == "latest"
                || self.registry.is_published(&identity.name, &identity.version);
            if !published {
                return ProcessOutput {
                    exit_code: 1,
                    stdout: String::new(),
                    stderr: format!("npm ERR! 404 No matching version found for {}", identity),
                };
            }
        }
        for identity in &identities {
            write_manifest(self.root(), identity);
        }
        ProcessOutput {
            exit_code: 0,
            stdout: format!("added {} packages", identities.len()),
            stderr: String::new(),
        }
    }

    fn uninstall(&self, names: &[String]) -> ProcessOutput {
        for name in names {
            let _ = std::fs::remove_dir_all(self.root().join("node_modules").join(name));
        }
        ProcessOutput {
            exit_code: 0,
            stdout: format!("removed {} packages", names.len()),
            stderr: String::new(),
        }
    }

    fn test(&self) -> ProcessOutput {
        let failing = self.failing.lock().unwrap().clone();
        let broken = failing
            .iter()
            .find(|id| self.installed_version(&id.name).as_deref() == Some(id.version.as_str()));
        match broken {
            Some(id) => ProcessOutput {
                exit_code: 1,
                stdout: String::new(),
                stderr: format!("{} is broken", id),
            },
            None => ProcessOutput {
                exit_code: 0,
                stdout: "ok".to_string(),
                stderr: String::new(),
            },
        }
    }
}

fn manifest_path(root: &Path, name: &str) -> PathBuf {
    root.join("node_modules").join(name).join("package.json")
}

fn write_manifest(root: &Path, identity: &PackageIdentity) {
    let path = manifest_path(root, &identity.name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let manifest = serde_json::json!({ "name": identity.name, "version": identity.version });
    std::fs::write(path, manifest.to_string()).unwrap();
}

#[async_trait]
impl ProcessRunner for FakePackageManager {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput> {
        self.history.lock().unwrap().push(invocation.command_line());

        let args: Vec<String> = invocation
            .args
            .iter()
            .filter(|a| *a != "--no-save")
            .cloned()
            .collect();
        let names: Vec<String> = match (invocation.program.as_str(), args.split_first()) {
            ("npm", Some((command, rest))) if command == "install" || command == "uninstall" => {
                rest.iter()
                    .map(|spec| PackageIdentity::name_of(spec).to_string())
                    .collect()
            }
            _ => Vec::new(),
        };

        self.enter(&names);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let output = match (invocation.program.as_str(), args.split_first()) {
            ("npm", Some((command, rest))) if command == "install" => self.install(rest),
            ("npm", Some((command, rest))) if command == "uninstall" => self.uninstall(rest),
            _ => self.test(),
        };
        self.leave(&names);
        Ok(output)
    }
}
