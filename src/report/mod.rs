//! Range compression, differencing and reporting
//!
//! ```text
//! summary files ──> files ──> grouping ──> ranges (fold/filter) ──> text report
//!                                   │
//!                                   └──> diff (baseline OS) ──> template ──> nodejs<major>.txt|.err
//! ```
//!
//! - [`summary`]: the persisted `Summary` record
//! - [`builder`]: builds and writes a `Summary` from sequencer results
//! - [`files`]: summary file name parsing, ordering, deduplication, loading
//! - [`coalesce`]: the adjacent-run reduction behind merging and folding
//! - [`grouping`]: groups by major runtime version and merges duplicates
//! - [`ranges`]: folding, filtering and range-list equality
//! - [`diff`]: cross-environment differencing
//! - [`template`]: `{{package:versions}}` rendering
//! - [`text`]: the human-readable report
//! - [`humanize`]: the whole pipeline

pub mod builder;
pub mod coalesce;
pub mod diff;
pub mod error;
pub mod files;
pub mod grouping;
pub mod humanize;
pub mod ranges;
pub mod summary;
pub mod template;
pub mod text;

pub use builder::{RunInfo, SummaryBuilder};
pub use error::ReportError;
pub use humanize::{HumanizeOptions, humanize};
pub use ranges::Filter;
pub use summary::{Range, RangeKey, Summary};
pub use text::ReportOptions;
