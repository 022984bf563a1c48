//! Walks one dependency's published versions and tests each in turn

use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::entity::builtin::is_builtin;
use crate::entity::{Entity, PackageIdentity, Task, TransitionObserver};
use crate::sequencer::error::SequencerError;
use crate::sequencer::location::InstallLocation;
use crate::sequencer::spec::{SCHEMA_V1, SCHEMA_V2, VersionSpec};
use crate::version::matcher::RangeMatcher;
use crate::version::registry::Registry;

/// Post-mapping hook applied to every candidate entity
pub type EntityMapper = Arc<dyn Fn(Entity) -> Entity + Send + Sync>;

/// How a suite of specs is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// One spec after another (deterministic log ordering)
    #[default]
    Sequential,
    /// Specs run together; every name a spec installs, its v2 dependencies
    /// included, stays single-flight
    PerDependency,
}

/// Drives version matrices against the shared install location.
///
/// Within one spec, candidates are installed and tested strictly one at a
/// time, and the location is restored to its pre-run state afterwards.
pub struct Sequencer {
    registry: Arc<dyn Registry>,
    matcher: Arc<dyn RangeMatcher>,
    location: Arc<InstallLocation>,
    runtime_version: String,
    observers: Vec<Arc<dyn TransitionObserver>>,
    entity_mapper: Option<EntityMapper>,
    concurrency: Concurrency,
}

impl Sequencer {
    pub fn new(
        registry: Arc<dyn Registry>,
        matcher: Arc<dyn RangeMatcher>,
        location: Arc<InstallLocation>,
        runtime_version: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            matcher,
            location,
            runtime_version: runtime_version.into(),
            observers: Vec::new(),
            entity_mapper: None,
            concurrency: Concurrency::default(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TransitionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_entity_mapper(mut self, mapper: EntityMapper) -> Self {
        self.entity_mapper = Some(mapper);
        self
    }

    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn location(&self) -> &Arc<InstallLocation> {
        &self.location
    }

    fn entity(&self, identity: PackageIdentity, task: Option<Task>) -> Entity {
        let mut entity = Entity::new(identity, task, self.location.context().clone());
        for observer in &self.observers {
            entity.add_observer(observer.clone());
        }
        entity
    }

    /// Run every spec of a versions file
    pub async fn run_suite(&self, specs: Vec<VersionSpec>) -> Vec<VersionSpec> {
        match self.concurrency {
            Concurrency::Sequential => {
                let mut done = Vec::with_capacity(specs.len());
                for spec in specs {
                    done.push(self.run_spec(spec).await);
                }
                done
            }
            Concurrency::PerDependency => {
                join_all(specs.into_iter().map(|spec| self.run_spec(spec))).await
            }
        }
    }

    /// Test every candidate version of one spec and attach the entities as `results`
    pub async fn run_spec(&self, mut spec: VersionSpec) -> VersionSpec {
        let builtin = is_builtin(&spec.name);

        // builtins never touch the install location; everything a candidate
        // installs stays locked until the location is restored
        let _guards = if builtin {
            Vec::new()
        } else {
            let dependencies = spec.dependency_names();
            self.location
                .lock_all(
                    std::iter::once(spec.name.as_str())
                        .chain(dependencies.iter().map(String::as_str)),
                )
                .await
        };

        let previous = if builtin {
            None
        } else {
            self.snapshot_previous(&spec).await
        };

        let mut results = match self.map_versions_to_entities(&spec, builtin).await {
            Ok(entities) => self.test_in_series(entities).await,
            Err(e) => {
                error!("{}: {}", spec.name, e);
                Vec::new()
            }
        };

        if !builtin {
            self.restore(previous, results.last_mut()).await;
        }

        spec.results = results;
        spec
    }

    async fn test_in_series(&self, entities: Vec<Entity>) -> Vec<Entity> {
        let mut tested = Vec::with_capacity(entities.len());
        for entity in entities {
            tested.push(entity.install_and_test().await);
        }
        tested
    }

    /// Entity for whatever version of the target (and its v2 dependencies) is installed now
    async fn snapshot_previous(&self, spec: &VersionSpec) -> Option<Entity> {
        let mut previous = match self.location.installed_version(&spec.name).await {
            Ok(Some(version)) => {
                let entity = self.entity(PackageIdentity::new(spec.name.as_str(), version), None);
                info!("Found {} already installed", entity);
                Some(entity)
            }
            Ok(None) => {
                info!("{}: no previous version", spec.name);
                None
            }
            Err(e) => {
                warn!("{}: no previous version - {}", spec.name, e);
                None
            }
        };

        if spec.schema_version == SCHEMA_V2 {
            let mut installed = Vec::new();
            for name in spec.dependency_names() {
                match self.location.installed_version(&name).await {
                    Ok(Some(version)) => {
                        let identity = PackageIdentity::new(name, version);
                        info!("Found dependency {} already installed", identity);
                        installed.push(identity);
                    }
                    Ok(None) => info!("{}: no previous version", name),
                    Err(e) => warn!("{}: no previous version - {}", name, e),
                }
            }
            // without a previous target there is nothing to reinstall them with
            if let Some(previous) = previous.as_mut() {
                previous.dependencies = installed;
            }
        }

        previous
    }

    /// Turn the published version list into candidate entities, marking the ones to skip
    pub async fn map_versions_to_entities(
        &self,
        spec: &VersionSpec,
        builtin: bool,
    ) -> Result<Vec<Entity>, SequencerError> {
        let task = spec.resolved_task();

        if builtin {
            let identity = PackageIdentity::new(spec.name.as_str(), self.runtime_version.as_str());
            return Ok(vec![self.apply_mapper(self.entity(identity, task))]);
        }

        if spec.schema_version != SCHEMA_V1 && spec.schema_version != SCHEMA_V2 {
            return Err(SequencerError::UnsupportedSchema {
                name: spec.name.clone(),
                version: spec.schema_version,
            });
        }

        let versions = self.registry.fetch_all_versions(&spec.name).await?;
        info!("{}: {} published versions", spec.name, versions.len());

        let v1_ranges = spec
            .range
            .as_ref()
            .map(|r| r.to_vec())
            .unwrap_or_default();

        let entities = versions
            .into_iter()
            .map(|version| {
                let mut entity =
                    self.entity(PackageIdentity::new(spec.name.as_str(), version), task.clone());
                if spec.schema_version == SCHEMA_V1 {
                    entity.skip = !self.matcher.satisfies_any(entity.version(), &v1_ranges);
                } else {
                    // ranges are expected in order and disjoint; on overlap the last match wins
                    let mut matched = false;
                    for range in &spec.ranges {
                        if self.matcher.satisfies(entity.version(), &range.range) {
                            matched = true;
                            entity.dependencies = range.dependency_identities();
                        }
                    }
                    entity.skip = !matched;
                }
                self.apply_mapper(entity)
            })
            .collect();

        Ok(entities)
    }

    fn apply_mapper(&self, entity: Entity) -> Entity {
        match &self.entity_mapper {
            Some(mapper) => mapper(entity),
            None => entity,
        }
    }

    /// Put the install location back the way it was before the run
    async fn restore(&self, previous: Option<Entity>, last: Option<&mut Entity>) {
        match (previous, last) {
            (Some(mut previous), _) => {
                info!("Restoring {}", previous);
                if let Err(e) = previous.install().await {
                    error!("Failed to restore initial state: {}", e);
                }
            }
            (None, Some(last)) => {
                info!("Uninstalling {}", last);
                last.uninstall().await;
            }
            (None, None) => {}
        }
    }
}
