use super::{load_engine, GlobalOptions};
use wxcomp::core::{WxcError, WxcResult};
use wxcomp::PhaseStatus;

/// Drive the engine through the same hooks a host build would call
pub async fn run(opts: &GlobalOptions) -> WxcResult<()> {
    let engine = load_engine(opts)?;

    let outcomes = [
        engine.on_assets_collected().await,
        engine.on_after_emit().await,
        engine.on_build_done().await,
    ];

    let mut failed = 0;
    for outcome in &outcomes {
        let icon = match outcome.status {
            PhaseStatus::Completed => "✓",
            PhaseStatus::Skipped => "-",
            PhaseStatus::Failed => {
                failed += 1;
                "✗"
            }
        };
        println!("{} {}: {}", icon, outcome.phase, outcome.summary);
    }

    if failed > 0 {
        return Err(WxcError::Task(format!("{} phase(s) failed", failed)));
    }
    Ok(())
}
