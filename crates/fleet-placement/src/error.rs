//! Scheduling error types.

use thiserror::Error;

/// Errors that reject a single placement's scheduling cycle.
///
/// They never abort evaluation of other placements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    #[error("placement {placement}: toleration #{index} is invalid: {reason}")]
    InvalidToleration {
        placement: String,
        index: usize,
        reason: String,
    },

    #[error(
        "placement {placement}: taint {taint_key} on cluster {cluster} was added in the future \
         but is tolerated with negative tolerationSeconds"
    )]
    InconsistentToleration {
        placement: String,
        cluster: String,
        taint_key: String,
    },
}

impl SchedulingError {
    /// The `{namespace}/{name}` key of the placement at fault.
    pub fn placement(&self) -> &str {
        match self {
            Self::InvalidToleration { placement, .. }
            | Self::InconsistentToleration { placement, .. } => placement,
        }
    }
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;
