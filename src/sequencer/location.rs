//! The shared install location as an explicit, single-flighted resource

use std::collections::{BTreeSet, HashMap};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::entity::InstallContext;
use crate::sequencer::error::LocationError;

/// Directory (under the working dir) packages are installed into
pub const MODULES_DIR: &str = "node_modules";

#[derive(Debug, Deserialize)]
struct Manifest {
    version: Option<String>,
}

/// Handle to the install location shared by every entity.
///
/// Holding the guard from [`lock`](InstallLocation::lock) is what makes a
/// dependency name single-flight: at most one matrix per name touches the
/// location at a time.
pub struct InstallLocation {
    context: Arc<InstallContext>,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl InstallLocation {
    pub fn new(context: Arc<InstallContext>) -> Self {
        Self {
            context,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &Arc<InstallContext> {
        &self.context
    }

    /// Exclusive access to `name` in the install location until the guard drops
    pub async fn lock(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            // a poisoned map still holds valid mutexes
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        debug!("Waiting for install location lock on {}", name);
        lock.lock_owned().await
    }

    /// Exclusive access to every name in `names`.
    ///
    /// Locks are taken in sorted order, so two callers with overlapping name
    /// sets cannot deadlock. Duplicates are locked once.
    pub async fn lock_all<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Vec<OwnedMutexGuard<()>> {
        let names: BTreeSet<&str> = names.into_iter().collect();
        let mut guards = Vec::with_capacity(names.len());
        for name in names {
            guards.push(self.lock(name).await);
        }
        guards
    }

    /// Manifest path of an installed package
    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.context
            .working_dir
            .join(MODULES_DIR)
            .join(name)
            .join("package.json")
    }

    /// Version of `name` currently installed, if any
    pub async fn installed_version(&self, name: &str) -> Result<Option<String>, LocationError> {
        let path = self.manifest_path(name);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(LocationError::Io { path, source }),
        };
        let manifest: Manifest = serde_json::from_str(&content)
            .map_err(|source| LocationError::Json {
                path: path.clone(),
                source,
            })?;
        manifest
            .version
            .map(Some)
            .ok_or(LocationError::MissingVersion(path))
    }
}
