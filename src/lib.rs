//! wxcomp: stage third-party mini-program component libraries into a build
//! output tree, register them in the app manifest, and prune the ones the
//! compiled app never uses.
//!
//! This crate holds the engine and re-exports the shared utilities of
//! `wxcomp-core`.

pub use wxcomp_core::{format_error_with_help, ErrorHelp, PackageDescriptor, WxcError, WxcResult};

/// Core module re-exported from wxcomp-core.
pub mod core {
    pub use wxcomp_core::*;
    pub use wxcomp_core::core::*;

    /// Path module re-exported from wxcomp-core.
    pub mod path {
        pub use wxcomp_core::core::path::*;
    }

    /// Comment-tolerant JSON re-exported from wxcomp-core.
    pub mod jsonc {
        pub use wxcomp_core::core::jsonc::*;
    }
}

/// Configuration (wxcomp.yaml).
pub mod config;

/// Library location and asset staging.
pub mod library;

/// Manifest model and merge.
pub mod manifest;

/// Markup scanning and reference closure.
pub mod resolver;

/// Dead component pruning.
pub mod prune;

/// Host build lifecycle hooks.
pub mod engine;

pub use config::{BuildContext, Config, LibraryPattern};
pub use engine::{Engine, Phase, PhaseOutcome, PhaseStatus};
