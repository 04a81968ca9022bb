//! Removing staged library components that nothing uses.

pub mod pruner;

pub use pruner::{apply, plan, DoomedComponent, PrunePlan, PruneReport};

use crate::config::{BuildContext, Config};
use crate::core::WxcResult;
use crate::manifest::ManifestFile;
use crate::resolver::{resolve_references, ReferenceSet};

/// Resolve the reference closure and compute the prune plan, touching nothing
///
/// Returns `None` when there is no manifest.
pub async fn plan_prune(config: &Config, ctx: &BuildContext) -> WxcResult<Option<(PrunePlan, ReferenceSet)>> {
    let Some(manifest) = ManifestFile::load(&ctx.manifest_path, config.manifest.scope).await? else {
        return Ok(None);
    };
    let usings = manifest.using_components()?;
    let references = resolve_references(config, ctx, &usings).await?;
    let plan = plan(&usings, &references, &config.patterns, config.namespace(), &ctx.output_dir);
    Ok(Some((plan, references)))
}

/// Prune unused library components from disk and from the manifest
///
/// The closure is fully resolved before anything is deleted. A missing
/// manifest makes this a no-op.
pub async fn prune_manifest(config: &Config, ctx: &BuildContext) -> WxcResult<PruneReport> {
    let Some(mut manifest) = ManifestFile::load(&ctx.manifest_path, config.manifest.scope).await? else {
        tracing::info!(path = %ctx.manifest_path.display(), "no manifest, skipping prune");
        return Ok(PruneReport::default());
    };

    let usings = manifest.using_components()?;
    let references = resolve_references(config, ctx, &usings).await?;
    let plan = plan(&usings, &references, &config.patterns, config.namespace(), &ctx.output_dir);

    let (usings, mut report) = apply(&plan, usings).await;
    report.written = manifest.save(&usings).await?;
    Ok(report)
}
