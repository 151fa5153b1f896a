//! Inputs the driver reads each cycle: the resource snapshot and the clock.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::Context;
use chrono::{DateTime, Utc};

use fleet_api::Snapshot;

/// Wall-clock time handed to the scheduler as `now`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Read path into cluster and placement state.
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self) -> anyhow::Result<Snapshot>;
}

/// Re-reads a snapshot file on every cycle.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for FileSource {
    fn snapshot(&self) -> anyhow::Result<Snapshot> {
        Snapshot::from_file(&self.path)
            .with_context(|| format!("loading snapshot {}", self.path.display()))
    }
}

/// In-memory snapshot that can be swapped between cycles.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    inner: Arc<RwLock<Snapshot>>,
}

impl MemorySource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Replace the snapshot seen by subsequent cycles.
    pub fn replace(&self, snapshot: Snapshot) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = snapshot;
    }
}

impl SnapshotSource for MemorySource {
    fn snapshot(&self) -> anyhow::Result<Snapshot> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }
}
