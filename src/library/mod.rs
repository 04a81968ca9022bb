//! Locating installed component libraries and staging their files.

pub mod copier;
pub mod locator;

pub use copier::{collect_all, emit, StagedFile};
pub use locator::locate;
