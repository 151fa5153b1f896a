//! Point-in-time view of clusters and placements.
//!
//! A scheduling cycle reads one `Snapshot` and never looks at live state
//! again, so every decision in the cycle sees the same inputs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::types::{ManagedCluster, Placement};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub clusters: Vec<ManagedCluster>,
    #[serde(default)]
    pub placements: Vec<Placement>,
}

impl Snapshot {
    /// Load a snapshot file. `.toml` files are parsed as TOML, anything
    /// else as JSON.
    pub fn from_file(path: &Path) -> ApiResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// Look up a placement by its `{namespace}/{name}` key.
    pub fn placement(&self, key: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.key() == key)
    }
}
