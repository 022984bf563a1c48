#![allow(dead_code)]

pub mod package_manager;
pub mod registry;
pub mod summaries;

pub use package_manager::FakePackageManager;
pub use registry::MockRegistry;
pub use summaries::write_summary;
