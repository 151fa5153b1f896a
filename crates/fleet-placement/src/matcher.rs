//! Taint/toleration matching.
//!
//! A cluster is admitted for a placement only if every one of its taints
//! is matched by at least one of the placement's tolerations. When more
//! than one toleration matches a taint, the first in declaration order
//! decides how long the taint is tolerated, even if a later one would
//! tolerate it for longer.

use chrono::{DateTime, TimeDelta, Utc};

use fleet_api::{Taint, Toleration, TolerationOperator};

use crate::expiry;

/// Outcome of comparing one toleration against one taint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    NoMatch,
    ToleratedForever,
    /// Grace time left; zero or negative means it already ran out.
    ToleratedWithExpiry(TimeDelta),
}

/// A taint tolerated for a bounded time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToleratedExpiring<'a> {
    pub taint: &'a Taint,
    /// Position of the deciding toleration in the placement.
    pub toleration_index: usize,
    pub toleration_seconds: i64,
}

/// Result of checking a cluster's taints against a placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TolerationVerdict<'a> {
    /// First taint no toleration matches, if any.
    pub untolerated: Option<&'a Taint>,
    /// Tolerated taints with a bounded grace period, in taint order.
    /// Empty when the cluster is not admitted.
    pub expiring: Vec<ToleratedExpiring<'a>>,
}

impl TolerationVerdict<'_> {
    pub fn admitted(&self) -> bool {
        self.untolerated.is_none()
    }
}

/// Check whether a single toleration matches a single taint.
pub fn matches(taint: &Taint, toleration: &Toleration) -> bool {
    if !toleration.is_wildcard() && toleration.key != taint.key {
        return false;
    }
    match toleration.operator {
        TolerationOperator::Exists => true,
        TolerationOperator::Equal => toleration.value == taint.value,
    }
}

/// Classify a taint against a single toleration at `now`.
pub fn match_result(taint: &Taint, toleration: &Toleration, now: DateTime<Utc>) -> MatchResult {
    if !matches(taint, toleration) {
        return MatchResult::NoMatch;
    }
    match toleration.toleration_seconds {
        None => MatchResult::ToleratedForever,
        Some(seconds) => MatchResult::ToleratedWithExpiry(expiry::remaining_for(taint, seconds, now)),
    }
}

/// Find the first toleration, in declaration order, that matches `taint`.
pub fn first_match<'t>(taint: &Taint, tolerations: &'t [Toleration]) -> Option<(usize, &'t Toleration)> {
    tolerations
        .iter()
        .enumerate()
        .find(|(_, toleration)| matches(taint, toleration))
}

/// Check a cluster's taints against a placement's tolerations.
pub fn tolerated<'a>(taints: &'a [Taint], tolerations: &[Toleration]) -> TolerationVerdict<'a> {
    let mut expiring = Vec::new();

    for taint in taints {
        let Some((index, toleration)) = first_match(taint, tolerations) else {
            return TolerationVerdict {
                untolerated: Some(taint),
                expiring: Vec::new(),
            };
        };
        if let Some(seconds) = toleration.toleration_seconds {
            expiring.push(ToleratedExpiring {
                taint,
                toleration_index: index,
                toleration_seconds: seconds,
            });
        }
    }

    TolerationVerdict {
        untolerated: None,
        expiring,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn equal_requires_key_and_value() {
        let taint = Taint::new("gpu", "true");

        assert!(matches(&taint, &Toleration::equal("gpu", "true")));
        assert!(!matches(&taint, &Toleration::equal("gpu", "false")));
        assert!(!matches(&taint, &Toleration::equal("cpu", "true")));
    }

    #[test]
    fn exists_ignores_values() {
        let taint = Taint::new("gpu", "true");
        let mut toleration = Toleration::exists("gpu");
        toleration.value = "something-else".to_string();

        assert!(matches(&taint, &toleration));
        assert!(!matches(&Taint::new("cpu", "true"), &toleration));
    }

    #[test]
    fn wildcard_matches_any_key() {
        assert!(matches(&Taint::new("gpu", "true"), &Toleration::wildcard()));
        assert!(matches(&Taint::new("", ""), &Toleration::wildcard()));
    }

    #[test]
    fn match_result_classifies() {
        let taint = Taint::new("unreachable", "").added_at(t0());
        let now = t0() + TimeDelta::seconds(30);

        assert_eq!(
            match_result(&taint, &Toleration::exists("other"), now),
            MatchResult::NoMatch
        );
        assert_eq!(
            match_result(&taint, &Toleration::exists("unreachable"), now),
            MatchResult::ToleratedForever
        );
        assert_eq!(
            match_result(&taint, &Toleration::exists("unreachable").for_seconds(90), now),
            MatchResult::ToleratedWithExpiry(TimeDelta::seconds(60))
        );
    }

    #[test]
    fn no_taints_is_admitted() {
        let verdict = tolerated(&[], &[]);
        assert!(verdict.admitted());
        assert!(verdict.expiring.is_empty());
    }

    #[test]
    fn every_taint_must_be_tolerated() {
        let taints = vec![Taint::new("gpu", "true"), Taint::new("zone", "edge")];
        let tolerations = vec![Toleration::equal("gpu", "true")];

        let verdict = tolerated(&taints, &tolerations);

        assert!(!verdict.admitted());
        assert_eq!(verdict.untolerated.map(|t| t.key.as_str()), Some("zone"));
        assert!(verdict.expiring.is_empty());
    }

    #[test]
    fn any_toleration_may_match_each_taint() {
        let taints = vec![Taint::new("gpu", "true"), Taint::new("zone", "edge")];
        let tolerations = vec![Toleration::exists("zone"), Toleration::equal("gpu", "true")];

        assert!(tolerated(&taints, &tolerations).admitted());
    }

    #[test]
    fn forever_tolerations_do_not_expire() {
        let taints = vec![Taint::new("gpu", "true")];
        let verdict = tolerated(&taints, &[Toleration::exists("gpu")]);

        assert!(verdict.admitted());
        assert!(verdict.expiring.is_empty());
    }

    #[test]
    fn first_declared_toleration_wins() {
        let taints = vec![Taint::new("unreachable", "").added_at(t0())];
        let tolerations = vec![
            Toleration::exists("unreachable").for_seconds(30),
            Toleration::exists("unreachable").for_seconds(300),
            Toleration::exists("unreachable"),
        ];

        let verdict = tolerated(&taints, &tolerations);

        assert_eq!(verdict.expiring.len(), 1);
        assert_eq!(verdict.expiring[0].toleration_index, 0);
        assert_eq!(verdict.expiring[0].toleration_seconds, 30);
    }

    #[test]
    fn earlier_forever_toleration_shadows_bounded_one() {
        let taints = vec![Taint::new("unreachable", "").added_at(t0())];
        let tolerations = vec![
            Toleration::wildcard(),
            Toleration::exists("unreachable").for_seconds(30),
        ];

        let verdict = tolerated(&taints, &tolerations);

        assert!(verdict.admitted());
        assert!(verdict.expiring.is_empty());
    }

    #[test]
    fn expiring_entries_follow_taint_order() {
        let taints = vec![
            Taint::new("b", "").added_at(t0()),
            Taint::new("a", "").added_at(t0()),
        ];
        let tolerations = vec![
            Toleration::exists("a").for_seconds(10),
            Toleration::exists("b").for_seconds(20),
        ];

        let verdict = tolerated(&taints, &tolerations);

        let keys: Vec<_> = verdict.expiring.iter().map(|e| e.taint.key.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(verdict.expiring[0].toleration_index, 1);
    }

    proptest! {
        #[test]
        fn wildcard_exists_matches_every_taint(key in ".*", value in ".*") {
            prop_assert!(matches(&Taint::new(key, value), &Toleration::wildcard()));
        }

        #[test]
        fn equal_matches_iff_key_and_value_equal(
            taint_key in "[a-c]{1,2}",
            taint_value in "[x-z]{0,2}",
            tol_key in "[a-c]{1,2}",
            tol_value in "[x-z]{0,2}",
        ) {
            let taint = Taint::new(taint_key.clone(), taint_value.clone());
            let toleration = Toleration::equal(tol_key.clone(), tol_value.clone());
            prop_assert_eq!(
                matches(&taint, &toleration),
                taint_key == tol_key && taint_value == tol_value
            );
        }

        #[test]
        fn zero_taints_admitted_for_any_tolerations(
            keys in proptest::collection::vec("[a-z]{1,4}", 0..5),
        ) {
            let tolerations: Vec<_> = keys.into_iter().map(Toleration::exists).collect();
            prop_assert!(tolerated(&[], &tolerations).admitted());
        }
    }
}
