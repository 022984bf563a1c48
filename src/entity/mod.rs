//! Entity layer: one (dependency, version) pair and its lifecycle
//!
//! - [`identity`]: `PackageIdentity` (name + pinned version)
//! - [`state`]: lifecycle states and pass/fail statuses
//! - [`task`]: shell or in-process test tasks behind one executor
//! - [`context`]: the runner, package manager and directory an entity acts on
//! - [`observer`]: transition observers (channel, logging)
//! - [`builtin`]: runtime-supplied modules that are never installed
//! - [`lifecycle`]: the `Entity` state machine

pub mod builtin;
pub mod context;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod observer;
pub mod state;
pub mod task;

pub use context::InstallContext;
pub use error::EntityError;
pub use identity::PackageIdentity;
pub use lifecycle::{Entity, EntityRecord, OutputLog};
pub use observer::{ChannelObserver, LoggingObserver, TransitionEvent, TransitionObserver};
pub use state::{EntityState, Status};
pub use task::{CallableTask, ShellTask, Task, TaskSpec};
