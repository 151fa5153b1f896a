//! `fleetctl evaluate` — one scheduling cycle over a snapshot file.

use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde_json::json;

use fleet_api::Snapshot;
use fleet_placement::{PlacementEvaluation, Rejection, ScheduleOutcome, schedule_all};

use crate::OutputFormat;

pub fn evaluate(
    snapshot_path: &Path,
    placement: Option<&str>,
    now: DateTime<Utc>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut snapshot = Snapshot::from_file(snapshot_path)?;
    if let Some(key) = placement {
        snapshot.placements.retain(|p| p.key() == key);
        if snapshot.placements.is_empty() {
            bail!("placement {key} not found in {}", snapshot_path.display());
        }
    }

    let evaluations = schedule_all(&snapshot, now);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&to_json(&evaluations, now))?);
        }
        OutputFormat::Text => {
            print!("{}", format_evaluations(&evaluations));
        }
    }

    let failed = evaluations.iter().filter(|e| e.result.is_err()).count();
    if failed > 0 {
        bail!("{failed} placement(s) failed validation");
    }
    Ok(())
}

pub fn to_json(evaluations: &[PlacementEvaluation], now: DateTime<Utc>) -> serde_json::Value {
    let placements: Vec<_> = evaluations
        .iter()
        .map(|e| match &e.result {
            Ok(outcome) => json!({
                "placement": e.placement,
                "admitted": outcome.admitted,
                "rejected": outcome.rejected,
                "requeue": outcome.requeue(),
                "requeueAfterSeconds": outcome.requeue_after.map(|d| d.as_secs_f64()),
            }),
            Err(err) => json!({
                "placement": e.placement,
                "error": err.to_string(),
            }),
        })
        .collect();

    json!({
        "evaluatedAt": now.to_rfc3339(),
        "placements": placements,
    })
}

pub fn format_evaluations(evaluations: &[PlacementEvaluation]) -> String {
    let mut out = String::new();
    for e in evaluations {
        match &e.result {
            Ok(outcome) => format_outcome(&mut out, &e.placement, outcome),
            Err(err) => {
                let _ = writeln!(out, "{}\n  invalid: {err}", e.placement);
            }
        }
    }
    out
}

fn format_outcome(out: &mut String, placement: &str, outcome: &ScheduleOutcome) {
    let _ = writeln!(out, "{placement}");

    let admitted: Vec<&str> = outcome.admitted.iter().map(String::as_str).collect();
    if admitted.is_empty() {
        let _ = writeln!(out, "  admitted: (none)");
    } else {
        let _ = writeln!(out, "  admitted: {}", admitted.join(", "));
    }

    for (cluster, rejection) in &outcome.rejected {
        let _ = writeln!(out, "  rejected: {cluster} ({})", describe(rejection));
    }

    match outcome.requeue_after {
        Some(after) => {
            let _ = writeln!(out, "  requeue: after {}", format_duration(after));
        }
        None => {
            let _ = writeln!(out, "  requeue: no");
        }
    }
}

fn describe(rejection: &Rejection) -> String {
    match rejection {
        Rejection::Untolerated {
            taint_key,
            taint_value,
        } if taint_value.is_empty() => format!("untolerated taint {taint_key}"),
        Rejection::Untolerated {
            taint_key,
            taint_value,
        } => format!("untolerated taint {taint_key}={taint_value}"),
        Rejection::Expired { taint_key, overdue } => {
            format!("toleration for {taint_key} expired {} ago", format_duration(*overdue))
        }
        Rejection::InvalidPlacement => "placement is invalid".to_string(),
    }
}

fn format_duration(d: Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use fleet_api::{ManagedCluster, Placement, Taint, Toleration};

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn sample() -> Snapshot {
        Snapshot {
            clusters: vec![
                ManagedCluster::new("gpu-1").with_taint(Taint::new("gpu", "true")),
                ManagedCluster::new("edge-1")
                    .with_taint(Taint::new("unreachable", "").added_at(t0())),
                ManagedCluster::new("plain"),
            ],
            placements: vec![
                Placement::new("default", "web")
                    .with_toleration(Toleration::exists("unreachable").for_seconds(90)),
                Placement::new("default", "broken").with_toleration(Toleration::equal("", "x")),
            ],
        }
    }

    #[test]
    fn text_report_lists_decisions() {
        let evaluations = schedule_all(&sample(), t0() + TimeDelta::seconds(30));
        let text = format_evaluations(&evaluations);

        assert!(text.contains("default/web\n  admitted: edge-1, plain\n"));
        assert!(text.contains("rejected: gpu-1 (untolerated taint gpu=true)"));
        assert!(text.contains("requeue: after 60s"));
        assert!(text.contains("default/broken\n  invalid: "));
    }

    #[test]
    fn text_report_shows_expiry() {
        let evaluations = schedule_all(&sample(), t0() + TimeDelta::milliseconds(91_500));
        let text = format_evaluations(&evaluations);

        assert!(text.contains("rejected: edge-1 (toleration for unreachable expired 1.500s ago)"));
        assert!(text.contains("requeue: no"));
    }

    #[test]
    fn json_report_carries_requeue() {
        let now = t0() + TimeDelta::seconds(30);
        let value = to_json(&schedule_all(&sample(), now), now);

        let web = &value["placements"][0];
        assert_eq!(web["placement"], "default/web");
        assert_eq!(web["requeue"], true);
        assert_eq!(web["requeueAfterSeconds"], 60.0);
        assert_eq!(web["rejected"]["gpu-1"]["reason"], "untolerated");

        let broken = &value["placements"][1];
        assert!(broken["error"].as_str().unwrap().contains("toleration #0"));
    }

    #[test]
    fn evaluate_fails_when_a_placement_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, serde_json::to_string(&sample()).unwrap()).unwrap();

        assert!(evaluate(&path, None, t0(), OutputFormat::Json).is_err());
        assert!(evaluate(&path, Some("default/web"), t0(), OutputFormat::Text).is_ok());
        assert!(evaluate(&path, Some("default/missing"), t0(), OutputFormat::Text).is_err());
    }

    #[test]
    fn bundled_snapshot_evaluates() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/snapshot.toml");
        let snapshot = Snapshot::from_file(&path).unwrap();
        let now = DateTime::parse_from_rfc3339("2024-05-01T12:01:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let evaluations = schedule_all(&snapshot, now);
        let web = evaluations[0].result.as_ref().unwrap();
        assert_eq!(web.admitted.len(), 2);
        assert!(web.is_admitted("west-1"));
        assert_eq!(web.requeue_after, Some(Duration::from_secs(240)));

        let training = evaluations[1].result.as_ref().unwrap();
        assert!(training.is_admitted("east-gpu"));
        assert!(!training.is_admitted("west-1"));
        assert!(!training.requeue());
    }
}
