use super::{load_engine, GlobalOptions};
use wxcomp::core::WxcResult;
use wxcomp::manifest::ManifestFile;
use wxcomp::resolver::resolve_references;

pub async fn run(opts: &GlobalOptions) -> WxcResult<()> {
    let engine = load_engine(opts)?;
    let config = engine.config();
    let ctx = engine.context();

    let Some(manifest) = ManifestFile::load(&ctx.manifest_path, config.manifest.scope).await? else {
        println!("No manifest at {}.", ctx.manifest_path.display());
        return Ok(());
    };
    let usings = manifest.using_components()?;
    let owned = usings.owned(&config.patterns, config.namespace());
    if owned.is_empty() {
        println!("No library components registered.");
        return Ok(());
    }

    let references = resolve_references(config, ctx, &usings).await?;
    let mut unused = 0;
    for entry in &owned {
        if references.contains(&entry.id) {
            println!("  ✓ {} -> {}", entry.key, entry.value);
        } else {
            unused += 1;
            println!("  ✗ {} -> {} (unused)", entry.key, entry.value);
        }
    }

    println!(
        "\n{} registered, {} in use, {} unused",
        owned.len(),
        owned.len() - unused,
        unused
    );
    Ok(())
}
