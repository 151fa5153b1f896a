//! `fleetctl watch` — keep placement decisions current until interrupted.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use fleet_requeue::{
    DecisionCallback, DriverConfig, EffectiveDecision, FileSource, RequeueDriver, SystemClock,
};

pub async fn watch(snapshot_path: &Path, config: DriverConfig) -> anyhow::Result<()> {
    // Fail fast on an unreadable snapshot instead of logging it every resync.
    fleet_api::Snapshot::from_file(snapshot_path)?;

    let source = Arc::new(FileSource::new(snapshot_path));
    let callback: DecisionCallback = Arc::new(log_decision);
    let mut driver =
        RequeueDriver::new(source, Arc::new(SystemClock), config).with_callback(callback);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => warn!(error = %e, "failed to install CTRL+C handler"),
        }
        let _ = shutdown_tx.send(true);
    });

    info!(snapshot = %snapshot_path.display(), "watching placements");
    driver.run(shutdown_rx).await;
    Ok(())
}

fn log_decision(placement: &str, decision: &EffectiveDecision) {
    let outcome = &decision.outcome;
    let requeue_after_secs = outcome.requeue_after.map(|d| d.as_secs_f64());
    match &decision.error {
        Some(err) => warn!(
            placement,
            admitted = outcome.admitted.len(),
            rejected = outcome.rejected.len(),
            error = %err,
            "decision held"
        ),
        None => info!(
            placement,
            admitted = outcome.admitted.len(),
            rejected = outcome.rejected.len(),
            requeue_after_secs,
            "decision"
        ),
    }
}
