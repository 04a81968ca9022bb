// Core functionality
pub mod core;

// Library package descriptor (package.json)
pub mod package;

// Re-export commonly used types
pub use core::{format_error_with_help, ErrorHelp, WxcError, WxcResult};
pub use package::descriptor::PackageDescriptor;
