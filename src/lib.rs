pub mod config;
pub mod entity;
pub mod logging;
pub mod process;
pub mod report;
pub mod sequencer;
pub mod version;
