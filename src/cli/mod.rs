pub mod build;
pub mod copy;
pub mod list;
pub mod merge;
pub mod prune;

use std::env;
use std::path::{Path, PathBuf};
use wxcomp::config::Config;
use wxcomp::core::{WxcError, WxcResult};
use wxcomp::Engine;

/// Flags shared by every subcommand
pub struct GlobalOptions {
    pub production: bool,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Load the configuration and build an engine for the current project
pub fn load_engine(opts: &GlobalOptions) -> WxcResult<Engine> {
    let current_dir = env::current_dir()
        .map_err(|e| WxcError::Path(format!("Failed to get current directory: {}", e)))?;

    let (project_root, config) = match &opts.config {
        Some(path) => {
            let path = current_dir.join(path);
            let root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| current_dir.clone());
            (root, Config::load(&path)?)
        }
        None => Config::discover(&current_dir)?,
    };

    let output = opts.output.as_ref().map(|dir| current_dir.join(dir));
    let ctx = config.context(&project_root, opts.production, output.as_deref());
    tracing::debug!(
        root = %project_root.display(),
        output = %ctx.output_dir.display(),
        "project loaded"
    );
    Engine::new(config, ctx)
}

/// Path shown relative to the project root when possible
pub fn display_path(engine: &Engine, path: &Path) -> String {
    pathdiff::diff_paths(path, &engine.context().project_root)
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
