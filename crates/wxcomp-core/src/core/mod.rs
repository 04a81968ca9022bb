pub mod error;
pub mod error_help;
pub mod jsonc;
pub mod path;

pub use error::{WxcError, WxcResult};
pub use error_help::{format_error_with_help, ErrorHelp};
