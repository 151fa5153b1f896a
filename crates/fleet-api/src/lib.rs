//! fleet-api — resource types for multi-cluster placement.
//!
//! These are the shapes the placement scheduler reads: managed clusters
//! carrying taints, and placements carrying tolerations. The scheduler
//! never mutates them; they arrive as an immutable [`Snapshot`] per
//! scheduling cycle.
//!
//! # Ordering
//!
//! Toleration order is part of the contract. When several tolerations
//! match one taint, the first one declared wins, so every type here keeps
//! lists as `Vec` and serializes them in declaration order.

pub mod error;
pub mod snapshot;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use snapshot::Snapshot;
pub use types::*;
