//! Registry implementations for fetching package versions

pub mod npm;

pub use npm::NpmRegistry;
