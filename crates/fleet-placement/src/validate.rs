//! Structural checks on placement tolerations.

use fleet_api::{Placement, TolerationOperator};

use crate::error::{SchedulingError, SchedulingResult};

/// Every invalid toleration on `placement`, in declaration order.
pub fn validate_tolerations(placement: &Placement) -> Vec<SchedulingError> {
    placement
        .tolerations
        .iter()
        .enumerate()
        .filter(|(_, toleration)| {
            toleration.is_wildcard() && toleration.operator == TolerationOperator::Equal
        })
        .map(|(index, _)| SchedulingError::InvalidToleration {
            placement: placement.key(),
            index,
            reason: "an empty key requires the Exists operator".to_string(),
        })
        .collect()
}

/// Fail with the first invalid toleration, if any.
pub fn validate_placement(placement: &Placement) -> SchedulingResult<()> {
    match validate_tolerations(placement).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
