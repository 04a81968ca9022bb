use super::{display_path, load_engine, GlobalOptions};
use wxcomp::core::WxcResult;
use wxcomp::prune::plan_prune;

pub async fn run(opts: &GlobalOptions, dry_run: bool) -> WxcResult<()> {
    let engine = load_engine(opts)?;
    let manifest = display_path(&engine, &engine.context().manifest_path);

    if dry_run {
        let Some((plan, references)) = plan_prune(engine.config(), engine.context()).await? else {
            println!("{} does not exist. Nothing to prune.", manifest);
            return Ok(());
        };
        println!("{} component(s) in use", references.len());
        if plan.doomed.is_empty() {
            println!("✓ Nothing to prune");
            return Ok(());
        }
        println!("Would remove:");
        for doomed in &plan.doomed {
            match &doomed.dir {
                Some(dir) => println!("  - {} ({})", doomed.key, display_path(&engine, dir)),
                None => println!("  - {} (directory shared, kept)", doomed.key),
            }
        }
        return Ok(());
    }

    let report = engine.prune().await?;
    if !report.manifest_found {
        println!("{} does not exist. Nothing to prune.", manifest);
        return Ok(());
    }

    for key in &report.removed {
        println!("  - {}", key);
    }
    for (key, error) in &report.failed {
        eprintln!("  ✗ {} (error: {})", key, error);
    }
    println!(
        "✓ Kept {} component(s), removed {}",
        report.kept.len(),
        report.removed.len()
    );
    Ok(())
}
