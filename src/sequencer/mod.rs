//! Version matrix sequencing
//!
//! - [`spec`]: `VersionSpec`, the declarative versions-file entry
//! - [`location`]: `InstallLocation`, the single-flighted shared install location
//! - [`sequencer`]: `Sequencer`, which walks a spec's versions and restores the location
//! - [`error`]: sequencer and location errors

pub mod error;
pub mod location;
#[allow(clippy::module_inception)]
pub mod sequencer;
pub mod spec;

pub use error::{LocationError, SequencerError};
pub use location::InstallLocation;
pub use sequencer::{Concurrency, EntityMapper, Sequencer};
pub use spec::{DependencyRange, RangeSelector, VersionSpec, parse_versions_file};
