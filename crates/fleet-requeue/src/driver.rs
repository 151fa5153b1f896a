//! Requeue driver — re-runs placement decisions when they are due.
//!
//! Every placement is evaluated on start and on each resync tick. Between
//! resyncs, a placement whose decision carries a requeue delay is
//! re-evaluated once that delay has elapsed, which is when one of its
//! tolerations runs out. Clusters already past their grace period are
//! handled by the next resync.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use fleet_api::Snapshot;
use fleet_placement::{ScheduleOutcome, schedule_decision};

use crate::cache::{DecisionCache, EffectiveDecision};
use crate::queue::RequeueQueue;
use crate::source::{Clock, SnapshotSource};

/// Default interval between full re-evaluations.
pub const DEFAULT_RESYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Delay before retrying due placements whose snapshot could not be read.
pub const REQUEUE_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Callback invoked with every decision the driver records.
pub type DecisionCallback = Arc<dyn Fn(&str, &EffectiveDecision) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub resync_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            resync_interval: DEFAULT_RESYNC_INTERVAL,
        }
    }
}

/// Requests re-evaluation of a placement from outside the driver, e.g.
/// when a watch reports that the placement or a cluster changed.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    tx: mpsc::UnboundedSender<(String, Duration)>,
}

impl TriggerHandle {
    /// Re-evaluate `key` as soon as possible.
    pub fn trigger(&self, key: &str) -> bool {
        self.trigger_after(key, Duration::ZERO)
    }

    /// Re-evaluate `key` no later than `delay` from now.
    ///
    /// Returns false if the driver has gone away.
    pub fn trigger_after(&self, key: &str, delay: Duration) -> bool {
        self.tx.send((key.to_string(), delay)).is_ok()
    }
}

pub struct RequeueDriver {
    source: Arc<dyn SnapshotSource>,
    clock: Arc<dyn Clock>,
    config: DriverConfig,
    queue: RequeueQueue,
    cache: DecisionCache,
    on_decision: Option<DecisionCallback>,
    trigger_tx: mpsc::UnboundedSender<(String, Duration)>,
    trigger_rx: mpsc::UnboundedReceiver<(String, Duration)>,
}

impl RequeueDriver {
    pub fn new(source: Arc<dyn SnapshotSource>, clock: Arc<dyn Clock>, config: DriverConfig) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        Self {
            source,
            clock,
            config,
            queue: RequeueQueue::new(),
            cache: DecisionCache::new(),
            on_decision: None,
            trigger_tx,
            trigger_rx,
        }
    }

    /// Set a callback for recorded decisions.
    pub fn with_callback(mut self, callback: DecisionCallback) -> Self {
        self.on_decision = Some(callback);
        self
    }

    pub fn trigger_handle(&self) -> TriggerHandle {
        TriggerHandle {
            tx: self.trigger_tx.clone(),
        }
    }

    /// Decision currently in force for `key`.
    pub fn decision(&self, key: &str) -> Option<&EffectiveDecision> {
        self.cache.get(key)
    }

    pub fn pending(&self) -> &RequeueQueue {
        &self.queue
    }

    /// Evaluate every placement in a fresh snapshot.
    ///
    /// Placements no longer present are forgotten. Returns the number of
    /// placements evaluated.
    pub fn resync(&mut self) -> anyhow::Result<usize> {
        let snapshot = self.source.snapshot()?;
        let present: BTreeSet<String> = snapshot.placements.iter().map(|p| p.key()).collect();

        self.queue.retain(|key| present.contains(key));
        self.cache.retain(|key| present.contains(key));

        for key in &present {
            self.evaluate(&snapshot, key);
        }

        debug!(placements = present.len(), pending = self.queue.len(), "resync complete");
        Ok(present.len())
    }

    /// Evaluate only `keys` against a fresh snapshot.
    pub fn evaluate_keys(&mut self, keys: &[String]) -> anyhow::Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let snapshot = self.source.snapshot()?;
        for key in keys {
            self.evaluate(&snapshot, key);
        }
        Ok(())
    }

    fn evaluate(&mut self, snapshot: &Snapshot, key: &str) {
        let Some(placement) = snapshot.placement(key) else {
            debug!(placement = %key, "placement gone, dropping");
            self.queue.cancel(key);
            self.cache.forget(key);
            return;
        };

        let now = self.clock.now();
        let result = schedule_decision(placement, &snapshot.clusters, now);
        let decision = self
            .cache
            .record(key, result, || ScheduleOutcome::reject_all(&snapshot.clusters));

        // A fresh decision supersedes whatever was pending for this key.
        self.queue.cancel(key);
        match (&decision.error, decision.outcome.requeue_after) {
            (Some(err), _) => {
                warn!(placement = %key, error = %err, "placement invalid, keeping previous decision");
            }
            (None, Some(after)) => {
                self.queue.schedule_after(key, after, Instant::now());
                debug!(placement = %key, requeue_after_secs = after.as_secs_f64(), "requeue scheduled");
            }
            (None, None) => {}
        }

        if let Some(ref cb) = self.on_decision {
            cb(key, decision);
        }
    }

    /// Run the driver until shutdown is signaled.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            resync_secs = self.config.resync_interval.as_secs(),
            "requeue driver starting"
        );

        // First tick fires immediately, giving the initial full evaluation.
        let mut resync = tokio::time::interval(self.config.resync_interval);
        resync.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let next = self.queue.next_deadline();

            tokio::select! {
                _ = resync.tick() => {
                    if let Err(e) = self.resync() {
                        error!(error = %format!("{e:#}"), "resync failed");
                    }
                }
                _ = sleep_until_deadline(next) => {
                    let now = Instant::now();
                    let due = self.queue.pop_due(now);
                    if let Err(e) = self.evaluate_keys(&due) {
                        error!(error = %format!("{e:#}"), placements = due.len(), "requeue evaluation failed");
                        for key in &due {
                            self.queue.schedule_after(key, REQUEUE_RETRY_BACKOFF, now);
                        }
                    }
                }
                Some((key, delay)) = self.trigger_rx.recv() => {
                    self.queue.schedule_after(&key, delay, Instant::now());
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("requeue driver shutting down");
                        break;
                    }
                }
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
