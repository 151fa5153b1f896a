//! Remaining grace time for tolerated taints.
//!
//! `remaining = tolerationSeconds - (now - timeAdded)`. A taint without
//! `timeAdded` has nothing left: it is due the moment it is seen.
//! Arithmetic saturates at the `TimeDelta` bounds instead of panicking.

use chrono::{DateTime, TimeDelta, Utc};

use fleet_api::Taint;

use crate::matcher::ToleratedExpiring;

/// Grace time left for one tolerated taint at `now`.
pub fn remaining(entry: &ToleratedExpiring<'_>, now: DateTime<Utc>) -> TimeDelta {
    remaining_for(entry.taint, entry.toleration_seconds, now)
}

pub(crate) fn remaining_for(taint: &Taint, toleration_seconds: i64, now: DateTime<Utc>) -> TimeDelta {
    let Some(added) = taint.time_added else {
        return TimeDelta::zero();
    };

    let window = TimeDelta::try_seconds(toleration_seconds).unwrap_or(if toleration_seconds < 0 {
        TimeDelta::MIN
    } else {
        TimeDelta::MAX
    });
    let elapsed = now.signed_duration_since(added);

    window.checked_sub(&elapsed).unwrap_or(if elapsed > TimeDelta::zero() {
        TimeDelta::MIN
    } else {
        TimeDelta::MAX
    })
}

/// The entry that runs out first, with its remaining time.
///
/// Ties go to the earliest entry.
pub fn earliest_expiry<'e, 'a>(
    entries: &'e [ToleratedExpiring<'a>],
    now: DateTime<Utc>,
) -> Option<(&'e ToleratedExpiring<'a>, TimeDelta)> {
    entries
        .iter()
        .map(|entry| (entry, remaining(entry, now)))
        .min_by_key(|(_, left)| *left)
}

/// Minimum remaining grace time across all entries, or `None` when
/// nothing expires.
pub fn minimum_remaining(entries: &[ToleratedExpiring<'_>], now: DateTime<Utc>) -> Option<TimeDelta> {
    earliest_expiry(entries, now).map(|(_, left)| left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn entry(taint: &Taint, seconds: i64) -> ToleratedExpiring<'_> {
        ToleratedExpiring {
            taint,
            toleration_index: 0,
            toleration_seconds: seconds,
        }
    }

    #[test]
    fn remaining_subtracts_elapsed() {
        let taint = Taint::new("unreachable", "").added_at(t0());

        assert_eq!(
            remaining(&entry(&taint, 90), t0() + TimeDelta::seconds(30)),
            TimeDelta::seconds(60)
        );
        assert_eq!(
            remaining(&entry(&taint, 90), t0() + TimeDelta::seconds(120)),
            TimeDelta::seconds(-30)
        );
    }

    #[test]
    fn remaining_keeps_sub_second_precision() {
        let taint = Taint::new("k", "").added_at(t0());
        let now = t0() + TimeDelta::milliseconds(1500);

        assert_eq!(remaining(&entry(&taint, 5), now), TimeDelta::milliseconds(3500));
    }

    #[test]
    fn missing_time_added_is_due_now() {
        let taint = Taint::new("unavailable", "");
        assert_eq!(remaining(&entry(&taint, 600), t0()), TimeDelta::zero());
    }

    #[test]
    fn non_positive_seconds_are_already_due() {
        let taint = Taint::new("k", "").added_at(t0());

        assert_eq!(remaining(&entry(&taint, 0), t0()), TimeDelta::zero());
        assert!(remaining(&entry(&taint, -5), t0()) < TimeDelta::zero());
    }

    #[test]
    fn extreme_seconds_saturate() {
        let taint = Taint::new("k", "").added_at(t0());

        assert_eq!(remaining(&entry(&taint, i64::MAX), t0()), TimeDelta::MAX);
        assert_eq!(remaining(&entry(&taint, i64::MIN), t0()), TimeDelta::MIN);
    }

    #[test]
    fn empty_list_has_no_expiry() {
        assert_eq!(minimum_remaining(&[], t0()), None);
    }

    #[test]
    fn minimum_picks_soonest() {
        let slow = Taint::new("slow", "").added_at(t0());
        let fast = Taint::new("fast", "").added_at(t0());
        let entries = vec![entry(&slow, 300), entry(&fast, 45)];
        let now = t0() + TimeDelta::seconds(15);

        assert_eq!(minimum_remaining(&entries, now), Some(TimeDelta::seconds(30)));

        let (first, _) = earliest_expiry(&entries, now).unwrap();
        assert_eq!(first.taint.key, "fast");
    }

    #[test]
    fn ties_resolve_to_first_entry() {
        let a = Taint::new("a", "").added_at(t0());
        let b = Taint::new("b", "").added_at(t0());
        let entries = vec![entry(&a, 60), entry(&b, 60)];

        let (first, _) = earliest_expiry(&entries, t0()).unwrap();
        assert_eq!(first.taint.key, "a");
    }

    proptest! {
        #[test]
        fn advancing_now_shrinks_remaining_by_same_delta(
            seconds in -10_000i64..10_000,
            offset in -10_000i64..10_000,
            delta in 0i64..10_000,
        ) {
            let taint = Taint::new("k", "").added_at(t0());
            let now = t0() + TimeDelta::seconds(offset);
            let later = now + TimeDelta::seconds(delta);

            let before = remaining(&entry(&taint, seconds), now);
            let after = remaining(&entry(&taint, seconds), later);

            prop_assert_eq!(before - after, TimeDelta::seconds(delta));
        }
    }
}
