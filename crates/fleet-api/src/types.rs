//! Domain types for managed clusters and placements.
//!
//! Field names serialize in `camelCase` so snapshot files read the same
//! as the cluster-manager resources they are exported from.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a managed cluster.
pub type ClusterId = String;

/// Taint placed on clusters whose health signal reports them unavailable.
pub const TAINT_UNAVAILABLE: &str = "cluster.open-cluster-management.io/unavailable";

/// Taint placed on clusters the hub has lost contact with.
pub const TAINT_UNREACHABLE: &str = "cluster.open-cluster-management.io/unreachable";

// ── Cluster ────────────────────────────────────────────────────────

/// A repelling marker on a managed cluster.
///
/// `key` is not unique within a cluster; two taints may share a key with
/// different values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    /// When the taint was first observed. Stamped by whoever applies the
    /// taint; an unset value is treated as already due.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_added: Option<DateTime<Utc>>,
}

impl Taint {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            time_added: None,
        }
    }

    /// Set the time the taint was added.
    pub fn added_at(mut self, at: DateTime<Utc>) -> Self {
        self.time_added = Some(at);
        self
    }
}

/// A remote cluster registered with the hub, as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedCluster {
    pub name: ClusterId,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub taints: Vec<Taint>,
}

impl ManagedCluster {
    pub fn new(name: impl Into<ClusterId>) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
            taints: Vec::new(),
        }
    }

    pub fn with_taint(mut self, taint: Taint) -> Self {
        self.taints.push(taint);
        self
    }
}

// ── Placement ──────────────────────────────────────────────────────

/// How a toleration compares itself against a taint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TolerationOperator {
    /// Key match alone is enough; values are ignored.
    Exists,
    /// Key and value must both match.
    #[default]
    Equal,
}

/// A placement-side declaration cancelling a matching taint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toleration {
    /// Empty means "every key" and is only valid with `Exists`.
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub operator: TolerationOperator,
    /// Compared only when `operator` is `Equal`.
    #[serde(default)]
    pub value: String,
    /// How long the taint is tolerated after it was added. `None` means
    /// forever; zero or negative means not at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toleration_seconds: Option<i64>,
}

impl Toleration {
    /// Tolerate `key` only when the taint value equals `value`.
    pub fn equal(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator: TolerationOperator::Equal,
            value: value.into(),
            toleration_seconds: None,
        }
    }

    /// Tolerate `key` with any value.
    pub fn exists(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator: TolerationOperator::Exists,
            value: String::new(),
            toleration_seconds: None,
        }
    }

    /// Tolerate every taint.
    pub fn wildcard() -> Self {
        Self::exists("")
    }

    /// Bound the toleration to `seconds` after the taint was added.
    pub fn for_seconds(mut self, seconds: i64) -> Self {
        self.toleration_seconds = Some(seconds);
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.key.is_empty()
    }
}

/// A policy selecting managed clusters for a workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub namespace: String,
    pub name: String,
    /// Declaration order is significant: the first matching toleration
    /// decides how long a taint is tolerated.
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
}

impl Placement {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            tolerations: Vec::new(),
        }
    }

    pub fn with_toleration(mut self, toleration: Toleration) -> Self {
        self.tolerations.push(toleration);
        self
    }

    /// Identifier used for requeues and error reports: `{namespace}/{name}`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}
