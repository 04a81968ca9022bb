use super::{display_path, load_engine, GlobalOptions};
use wxcomp::core::WxcResult;

pub async fn run(opts: &GlobalOptions) -> WxcResult<()> {
    let engine = load_engine(opts)?;
    let manifest = display_path(&engine, &engine.context().manifest_path);

    let report = engine.merge().await?;
    if !report.manifest_found {
        println!("{} does not exist. Nothing to merge.", manifest);
        return Ok(());
    }

    println!("✓ Registered {} component(s) in {}", report.registered.len(), manifest);
    if !report.removed.is_empty() {
        println!("  Replaced {} previous entr(ies)", report.removed.len());
    }
    if !report.written {
        println!("  Manifest already up to date");
    }
    Ok(())
}
