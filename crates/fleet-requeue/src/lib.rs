//! fleet-requeue — eviction requeue driver for placement decisions.
//!
//! The scheduling core reports, per placement, how long until one of its
//! admitted clusters runs out of toleration. This crate turns that into
//! timers: it re-evaluates each placement no later than its requeue delay,
//! and on a periodic resync for everything else.
//!
//! # Architecture
//!
//! ```text
//! RequeueDriver
//!   ├── SnapshotSource (clusters + placements per cycle)
//!   ├── Clock (wall-clock `now` handed to the scheduler)
//!   ├── RequeueQueue (one pending deadline per placement, soonest wins)
//!   ├── DecisionCache (last effective decision per placement)
//!   └── Optional DecisionCallback for downstream stages
//! ```
//!
//! # Invalid placements
//!
//! A placement that fails validation keeps its previous decision, marked
//! stale, until it is fixed. A placement that was never valid rejects
//! every cluster.

pub mod cache;
pub mod driver;
pub mod queue;
pub mod source;

pub use cache::{DecisionCache, EffectiveDecision};
pub use driver::{DecisionCallback, DriverConfig, RequeueDriver, TriggerHandle};
pub use queue::RequeueQueue;
pub use source::{Clock, FileSource, MemorySource, SnapshotSource, SystemClock};
