//! Which library components does the compiled app actually use?

pub mod reference_graph;
pub mod scanner;

pub use reference_graph::{ReferenceResolver, ReferenceSet};
pub use scanner::{markup_files, scan_markup, TagScanner};

use crate::config::{BuildContext, Config};
use crate::core::WxcResult;
use crate::manifest::UsingComponents;

/// Scan the compiled markup and expand it into the full reference closure
pub async fn resolve_references(
    config: &Config,
    ctx: &BuildContext,
    usings: &UsingComponents,
) -> WxcResult<ReferenceSet> {
    let scanner = TagScanner::new(&config.patterns)?;
    let seeds = scan_markup(&ctx.output_dir, config.namespace(), &config.markup_ext, &scanner).await?;
    tracing::info!(seeds = seeds.len(), "library components used in markup");

    let resolver = ReferenceResolver::new(
        &ctx.output_dir,
        config.namespace(),
        &config.patterns,
        &config.descriptor_ext,
    );
    let references = resolver.resolve(seeds, usings).await;
    tracing::info!(total = references.len(), "library components reachable");
    Ok(references)
}
