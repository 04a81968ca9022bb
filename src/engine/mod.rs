//! Lifecycle hooks for a host build.
//!
//! The host calls [`Engine::on_assets_collected`] while it gathers output
//! assets, [`Engine::on_after_emit`] once the output tree is written, and
//! [`Engine::on_build_done`] after a complete build. Hooks never fail: errors
//! are logged and reported in the returned [`PhaseOutcome`] so the host can
//! always carry on.

use crate::config::{BuildContext, Config};
use crate::core::WxcResult;
use crate::library::{collect_all, emit};
use crate::manifest::{merge_manifest, MergeReport};
use crate::prune::{prune_manifest, PruneReport};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AssetsCollected,
    AfterEmit,
    BuildDone,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::AssetsCollected => "asset-collection",
            Phase::AfterEmit => "after-emit",
            Phase::BuildDone => "build-done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    Completed,
    Skipped,
    Failed,
}

/// Completion signal handed back to the host
#[derive(Debug, Clone)]
pub struct PhaseOutcome {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub summary: String,
}

impl PhaseOutcome {
    fn completed(phase: Phase, summary: String) -> Self {
        Self { phase, status: PhaseStatus::Completed, summary }
    }

    fn skipped(phase: Phase, summary: &str) -> Self {
        Self { phase, status: PhaseStatus::Skipped, summary: summary.to_string() }
    }

    fn failed(phase: Phase, error: &crate::core::WxcError) -> Self {
        tracing::error!(phase = %phase, error = %error, "phase failed");
        Self { phase, status: PhaseStatus::Failed, summary: error.to_string() }
    }
}

/// Result of staging library assets into the output tree
#[derive(Debug, Clone, Default)]
pub struct CopyReport {
    pub files: usize,
    /// Modules that contributed at least one file, in pattern order
    pub modules: Vec<String>,
}

/// The component staging and pruning engine for one build
pub struct Engine {
    config: Config,
    ctx: BuildContext,
}

impl Engine {
    /// Create an engine; an invalid configuration is rejected here, before
    /// anything touches disk
    pub fn new(config: Config, ctx: BuildContext) -> WxcResult<Self> {
        config.validate()?;
        Ok(Self { config, ctx })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    /// Copy every configured library into `<output>/<namespace>/<module>/`
    pub async fn copy_assets(&self) -> WxcResult<CopyReport> {
        let files = collect_all(&self.ctx.project_root, &self.config.patterns, self.config.namespace()).await;
        let written = emit(&self.ctx.output_dir, &files).await?;

        let mut modules: Vec<String> = Vec::new();
        for file in &files {
            if modules.last() != Some(&file.module) {
                modules.push(file.module.clone());
            }
        }
        Ok(CopyReport { files: written, modules })
    }

    /// Register staged components in the manifest
    pub async fn merge(&self) -> WxcResult<MergeReport> {
        merge_manifest(&self.config, &self.ctx).await
    }

    /// Drop unreferenced components from the manifest and the output tree
    pub async fn prune(&self) -> WxcResult<PruneReport> {
        prune_manifest(&self.config, &self.ctx).await
    }

    /// Asset collection: stage the libraries, then register them
    pub async fn on_assets_collected(&self) -> PhaseOutcome {
        let phase = Phase::AssetsCollected;
        let copied = match self.copy_assets().await {
            Ok(report) => report,
            Err(e) => return PhaseOutcome::failed(phase, &e),
        };
        match self.merge().await {
            Ok(merged) => PhaseOutcome::completed(
                phase,
                format!(
                    "staged {} file(s), registered {} component(s)",
                    copied.files,
                    merged.registered.len()
                ),
            ),
            Err(e) => PhaseOutcome::failed(phase, &e),
        }
    }

    /// After the output tree is written: merge against the final listing
    pub async fn on_after_emit(&self) -> PhaseOutcome {
        let phase = Phase::AfterEmit;
        match self.merge().await {
            Ok(report) if !report.manifest_found => PhaseOutcome::skipped(phase, "no manifest"),
            Ok(report) => PhaseOutcome::completed(
                phase,
                format!(
                    "registered {} component(s), replaced {} stale entr(ies)",
                    report.registered.len(),
                    report.removed.len()
                ),
            ),
            Err(e) => PhaseOutcome::failed(phase, &e),
        }
    }

    /// After a complete build: prune, for production builds only
    pub async fn on_build_done(&self) -> PhaseOutcome {
        let phase = Phase::BuildDone;
        if !self.ctx.production {
            return PhaseOutcome::skipped(phase, "development build, nothing pruned");
        }
        match self.prune().await {
            Ok(report) if !report.manifest_found => PhaseOutcome::skipped(phase, "no manifest"),
            Ok(report) => PhaseOutcome::completed(
                phase,
                format!(
                    "kept {} component(s), removed {}, {} failed",
                    report.kept.len(),
                    report.removed.len(),
                    report.failed.len()
                ),
            ),
            Err(e) => PhaseOutcome::failed(phase, &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibraryPattern;
    use crate::core::path::package_dir;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project(production: bool) -> (TempDir, Engine) {
        let temp = TempDir::new().unwrap();
        let lib = package_dir(temp.path(), "lx-ui");
        write(&lib.join("package.json"), r#"{ "miniprogram": "lib" }"#);
        write(&lib.join("lib/a/index.json"), r#"{ "component": true, "usingComponents": { "b": "../b/index" } }"#);
        write(&lib.join("lib/a/index.wxml"), "<b />");
        write(&lib.join("lib/b/index.json"), r#"{ "component": true }"#);
        write(&lib.join("lib/b/index.wxml"), "<view />");

        let config = Config {
            patterns: vec![LibraryPattern::new("lx-ui", "lx")],
            ..Default::default()
        };
        let ctx = config.context(temp.path(), production, None);
        write(&ctx.manifest_path, "{\n  \"pages\": [\"pages/index/index\"],\n  \"usingComponents\": {}\n}\n");
        write(&ctx.output_dir.join("pages/index/index.wxml"), "<view><lx-a /></view>");

        let engine = Engine::new(config, ctx).unwrap();
        (temp, engine)
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = Config::default();
        let ctx = config.context(Path::new("/tmp"), false, None);
        assert!(Engine::new(config, ctx).is_err());
    }

    #[tokio::test]
    async fn test_full_lifecycle_production() {
        let (_temp, engine) = project(true);

        let collected = engine.on_assets_collected().await;
        assert_eq!(collected.status, PhaseStatus::Completed);
        assert_eq!(engine.on_after_emit().await.status, PhaseStatus::Completed);

        let done = engine.on_build_done().await;
        assert_eq!(done.status, PhaseStatus::Completed);

        let app = fs::read_to_string(&engine.context().manifest_path).unwrap();
        assert!(app.contains("\"lx-a\": \"/wxcomponents/lx-ui/a/index\""));
        assert!(app.contains("\"lx-b\": \"/wxcomponents/lx-ui/b/index\""));
    }

    #[tokio::test]
    async fn test_build_done_skipped_in_development() {
        let (_temp, engine) = project(false);
        let outcome = engine.on_build_done().await;
        assert_eq!(outcome.status, PhaseStatus::Skipped);
    }

    #[tokio::test]
    async fn test_after_emit_without_manifest_is_skipped() {
        let (_temp, engine) = project(false);
        fs::remove_file(&engine.context().manifest_path).unwrap();
        let outcome = engine.on_after_emit().await;
        assert_eq!(outcome.status, PhaseStatus::Skipped);
    }

    #[tokio::test]
    async fn test_broken_manifest_fails_phase_without_panicking() {
        let (_temp, engine) = project(true);
        fs::write(&engine.context().manifest_path, "{ not json").unwrap();
        let outcome = engine.on_after_emit().await;
        assert_eq!(outcome.status, PhaseStatus::Failed);
        assert_eq!(outcome.phase, Phase::AfterEmit);
    }
}
