//! `fleetctl validate` — structural checks on every placement's tolerations.

use std::path::Path;

use anyhow::bail;

use fleet_api::Snapshot;
use fleet_placement::{SchedulingError, validate_tolerations};

pub fn validate(snapshot_path: &Path) -> anyhow::Result<()> {
    let snapshot = Snapshot::from_file(snapshot_path)?;
    let report = check(&snapshot);

    for (placement, errors) in &report {
        if errors.is_empty() {
            println!("ok       {placement}");
        } else {
            for err in errors {
                println!("INVALID  {err}");
            }
        }
    }

    let failed = report.iter().filter(|(_, errors)| !errors.is_empty()).count();
    if failed > 0 {
        bail!("{failed} of {} placement(s) failed validation", report.len());
    }
    println!("{} placement(s) valid", report.len());
    Ok(())
}

/// Per-placement validation errors, in snapshot order.
pub fn check(snapshot: &Snapshot) -> Vec<(String, Vec<SchedulingError>)> {
    snapshot
        .placements
        .iter()
        .map(|p| (p.key(), validate_tolerations(p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_api::{Placement, Toleration};

    fn snapshot() -> Snapshot {
        Snapshot {
            clusters: Vec::new(),
            placements: vec![
                Placement::new("default", "web")
                    .with_toleration(Toleration::wildcard())
                    .with_toleration(Toleration::equal("gpu", "true")),
                Placement::new("default", "broken")
                    .with_toleration(Toleration::exists("gpu"))
                    .with_toleration(Toleration::equal("", "x")),
            ],
        }
    }

    #[test]
    fn reports_only_invalid_tolerations() {
        let report = check(&snapshot());

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].0, "default/web");
        assert!(report[0].1.is_empty());

        assert_eq!(report[1].0, "default/broken");
        assert_eq!(report[1].1.len(), 1);
        assert!(matches!(
            report[1].1[0],
            SchedulingError::InvalidToleration { index: 1, .. }
        ));
    }

    #[test]
    fn validate_fails_on_invalid_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.json");
        std::fs::write(&path, serde_json::to_string(&snapshot()).unwrap()).unwrap();

        let err = validate(&path).unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
    }
}
