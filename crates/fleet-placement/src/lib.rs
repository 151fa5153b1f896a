//! fleet-placement — taint/toleration filtering for placement scheduling.
//!
//! Decides, per candidate cluster, whether a placement may select it, and
//! computes a single requeue delay after which the decision will change
//! because a tolerated taint runs out of grace time.
//!
//! Every function here is a pure function of its inputs and an injected
//! `now`. Nothing reads the system clock or keeps state between calls, so
//! placements can be evaluated on any number of workers at once.
//!
//! # Components
//!
//! - **`matcher`** — Taint/toleration matching (first match wins)
//! - **`expiry`** — Remaining grace time for tolerated taints
//! - **`validate`** — Structural checks on a placement's tolerations
//! - **`extender`** — Per-placement decision: admitted, rejected, requeue

pub mod error;
pub mod expiry;
pub mod extender;
pub mod matcher;
pub mod validate;

pub use error::{SchedulingError, SchedulingResult};
pub use expiry::{earliest_expiry, minimum_remaining, remaining};
pub use extender::{PlacementEvaluation, Rejection, ScheduleOutcome, schedule_all, schedule_decision};
pub use matcher::{MatchResult, ToleratedExpiring, TolerationVerdict, match_result, matches, tolerated};
pub use validate::{validate_placement, validate_tolerations};
