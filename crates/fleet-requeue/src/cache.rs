//! Last effective decision per placement.

use std::collections::HashMap;

use fleet_placement::{ScheduleOutcome, SchedulingError, SchedulingResult};

/// The decision currently in force for a placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveDecision {
    pub outcome: ScheduleOutcome,
    /// Set when the latest evaluation failed and `outcome` is a carried-over
    /// or fallback decision.
    pub error: Option<SchedulingError>,
}

impl EffectiveDecision {
    pub fn is_stale(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Default)]
pub struct DecisionCache {
    decisions: HashMap<String, EffectiveDecision>,
}

impl DecisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of evaluating `key`.
    ///
    /// A failed evaluation keeps the prior outcome in force, or installs
    /// `fallback` if there is none.
    pub fn record(
        &mut self,
        key: &str,
        result: SchedulingResult<ScheduleOutcome>,
        fallback: impl FnOnce() -> ScheduleOutcome,
    ) -> &EffectiveDecision {
        let decision = match result {
            Ok(outcome) => EffectiveDecision {
                outcome,
                error: None,
            },
            Err(err) => {
                let outcome = match self.decisions.remove(key) {
                    Some(prior) => prior.outcome,
                    None => fallback(),
                };
                EffectiveDecision {
                    outcome,
                    error: Some(err),
                }
            }
        };

        self.decisions.insert(key.to_string(), decision);
        &self.decisions[key]
    }

    pub fn get(&self, key: &str) -> Option<&EffectiveDecision> {
        self.decisions.get(key)
    }

    pub fn forget(&mut self, key: &str) -> bool {
        self.decisions.remove(key).is_some()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.decisions.retain(|key, _| keep(key));
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}
