//! Version discovery and range satisfaction
//!
//! The harness needs two things from the version layer: the full published
//! version list of a package, and a way to ask whether a version falls in a
//! declared range. Both are traits so the sequencer can be driven by fakes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐
//! │   Registry  │     │   Matcher   │
//! │  (fetch)    │     │ (satisfies) │
//! └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │ Registries  │     │    Range    │
//! │   (npm)     │     │ (npm ranges)│
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`registry`]: Registry trait for fetching versions from remote sources
//! - [`registries`]: Concrete registry implementations (npm)
//! - [`matcher`]: Range satisfaction trait and its npm implementation
//! - [`range`]: npm range grammar parsed into comparator sets
//! - [`error`]: Error types for registry operations
//! - [`semver`]: Shared semver utilities

pub mod error;
pub mod matcher;
pub mod range;
pub mod registries;
pub mod registry;
pub mod semver;
