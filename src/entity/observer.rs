//! Observation of entity state transitions
//!
//! The state machine publishes `(from, to, entity)` for every transition and
//! knows nothing about who listens. Progress output and tests both attach here.

use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::entity::{Entity, EntityState, PackageIdentity, Status};

pub trait TransitionObserver: Send + Sync {
    fn on_transition(&self, from: EntityState, to: EntityState, entity: &Entity);
}

/// Owned snapshot of a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEvent {
    pub from: EntityState,
    pub to: EntityState,
    pub identity: PackageIdentity,
    pub install_status: Option<Status>,
    pub test_status: Option<Status>,
}

/// Forwards transitions into an unbounded channel
pub struct ChannelObserver {
    tx: UnboundedSender<TransitionEvent>,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<TransitionEvent>) -> Self {
        Self { tx }
    }
}

impl TransitionObserver for ChannelObserver {
    fn on_transition(&self, from: EntityState, to: EntityState, entity: &Entity) {
        // receiver gone means nobody is listening any more
        let _ = self.tx.send(TransitionEvent {
            from,
            to,
            identity: entity.identity().clone(),
            install_status: entity.install_status(),
            test_status: entity.test_status(),
        });
    }
}

/// Logs each transition at info level
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl TransitionObserver for LoggingObserver {
    fn on_transition(&self, from: EntityState, to: EntityState, entity: &Entity) {
        info!(
            "{}: {} -> {} (install {:?}, test {:?})",
            entity,
            from,
            to,
            entity.install_status(),
            entity.test_status()
        );
    }
}
