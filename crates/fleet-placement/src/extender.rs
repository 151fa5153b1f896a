//! Schedule decision extender — the taint/toleration filter stage.
//!
//! Given a placement and the clusters that survived earlier filters, the
//! extender:
//! 1. Rejects clusters carrying a taint no toleration matches
//! 2. Rejects clusters whose tolerated taints have run out of grace time
//! 3. Admits the rest, and reports the shortest remaining grace time
//!    across them as the placement's requeue delay
//!
//! Clusters rejected for an expired toleration do not shorten the requeue
//! delay; they are already out and the next regular cycle picks them up.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use fleet_api::{ClusterId, ManagedCluster, Placement, Snapshot};

use crate::error::{SchedulingError, SchedulingResult};
use crate::expiry::earliest_expiry;
use crate::matcher::{TolerationVerdict, tolerated};
use crate::validate::validate_placement;

/// Why a cluster was filtered out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum Rejection {
    /// The cluster has a taint the placement does not tolerate.
    #[serde(rename_all = "camelCase")]
    Untolerated { taint_key: String, taint_value: String },
    /// A tolerated taint's grace period has elapsed.
    #[serde(rename_all = "camelCase")]
    Expired { taint_key: String, overdue: Duration },
    /// The placement itself failed validation.
    InvalidPlacement,
}

/// The decision for one placement in one scheduling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOutcome {
    pub admitted: BTreeSet<ClusterId>,
    pub rejected: BTreeMap<ClusterId, Rejection>,
    /// Delay until an admitted cluster's toleration runs out. `None`
    /// means nothing expires and no requeue is needed.
    pub requeue_after: Option<Duration>,
}

impl ScheduleOutcome {
    /// Outcome used while a placement is invalid: every candidate rejected.
    pub fn reject_all(clusters: &[ManagedCluster]) -> Self {
        Self {
            admitted: BTreeSet::new(),
            rejected: clusters
                .iter()
                .map(|c| (c.name.clone(), Rejection::InvalidPlacement))
                .collect(),
            requeue_after: None,
        }
    }

    pub fn requeue(&self) -> bool {
        self.requeue_after.is_some()
    }

    pub fn is_admitted(&self, cluster: &str) -> bool {
        self.admitted.contains(cluster)
    }
}

/// Result of evaluating one placement within a multi-placement cycle.
#[derive(Debug, Clone)]
pub struct PlacementEvaluation {
    pub placement: String,
    pub result: SchedulingResult<ScheduleOutcome>,
}

/// Run the taint/toleration stage for one placement at `now`.
pub fn schedule_decision(
    placement: &Placement,
    clusters: &[ManagedCluster],
    now: DateTime<Utc>,
) -> SchedulingResult<ScheduleOutcome> {
    let key = placement.key();
    validate_placement(placement)?;

    let mut outcome = ScheduleOutcome::default();
    let mut soonest: Option<TimeDelta> = None;

    for cluster in clusters {
        let verdict = tolerated(&cluster.taints, &placement.tolerations);

        if let Some(taint) = verdict.untolerated {
            debug!(
                placement = %key,
                cluster = %cluster.name,
                taint = %taint.key,
                "cluster has untolerated taint"
            );
            outcome.rejected.insert(
                cluster.name.clone(),
                Rejection::Untolerated {
                    taint_key: taint.key.clone(),
                    taint_value: taint.value.clone(),
                },
            );
            continue;
        }

        check_consistency(&key, cluster, &verdict, now)?;

        match earliest_expiry(&verdict.expiring, now) {
            None => {
                outcome.admitted.insert(cluster.name.clone());
            }
            Some((entry, left)) if left <= TimeDelta::zero() => {
                debug!(
                    placement = %key,
                    cluster = %cluster.name,
                    taint = %entry.taint.key,
                    overdue_ms = (-left).num_milliseconds(),
                    "toleration expired, evicting cluster"
                );
                outcome.rejected.insert(
                    cluster.name.clone(),
                    Rejection::Expired {
                        taint_key: entry.taint.key.clone(),
                        overdue: (-left).to_std().unwrap_or_default(),
                    },
                );
            }
            Some((_, left)) => {
                outcome.admitted.insert(cluster.name.clone());
                soonest = Some(soonest.map_or(left, |s| s.min(left)));
            }
        }
    }

    outcome.requeue_after = soonest.and_then(|d| d.to_std().ok());

    info!(
        placement = %key,
        admitted = outcome.admitted.len(),
        rejected = outcome.rejected.len(),
        requeue_after_secs = outcome.requeue_after.map(|d| d.as_secs_f64()),
        "taint/toleration stage complete"
    );

    Ok(outcome)
}

/// Evaluate every placement in `snapshot` against all of its clusters.
///
/// A failing placement only affects its own entry.
pub fn schedule_all(snapshot: &Snapshot, now: DateTime<Utc>) -> Vec<PlacementEvaluation> {
    snapshot
        .placements
        .iter()
        .map(|placement| {
            let result = schedule_decision(placement, &snapshot.clusters, now);
            if let Err(e) = &result {
                warn!(placement = %placement.key(), error = %e, "placement rejected by validation");
            }
            PlacementEvaluation {
                placement: placement.key(),
                result,
            }
        })
        .collect()
}

// A negative window on a taint stamped in the future cannot be ordered
// against `now` meaningfully.
fn check_consistency(
    key: &str,
    cluster: &ManagedCluster,
    verdict: &TolerationVerdict<'_>,
    now: DateTime<Utc>,
) -> SchedulingResult<()> {
    let offending = verdict.expiring.iter().find(|entry| {
        entry.toleration_seconds < 0 && entry.taint.time_added.is_some_and(|added| added > now)
    });

    match offending {
        Some(entry) => Err(SchedulingError::InconsistentToleration {
            placement: key.to_string(),
            cluster: cluster.name.clone(),
            taint_key: entry.taint.key.clone(),
        }),
        None => Ok(()),
    }
}
