use super::{display_path, load_engine, GlobalOptions};
use wxcomp::core::WxcResult;

pub async fn run(opts: &GlobalOptions) -> WxcResult<()> {
    let engine = load_engine(opts)?;
    let output = display_path(&engine, &engine.context().output_dir);

    println!("Copying component libraries into {}...", output);
    let report = engine.copy_assets().await?;

    for module in &report.modules {
        println!("  ✓ {}", module);
    }
    let missing = engine
        .config()
        .patterns
        .iter()
        .filter(|p| !report.modules.contains(&p.module))
        .count();
    if missing > 0 {
        println!("  ⚠️  {} library(ies) contributed no files (run with RUST_LOG=warn for details)", missing);
    }

    println!("✓ Staged {} file(s)", report.files);
    Ok(())
}
