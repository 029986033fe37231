//! Sleep duration and qualified-rest calculation.
//!
//! Pure interval arithmetic over a session's timestamps and its list of
//! mid-session wake cycles. Every derived value is recomputed from
//! scratch on each call; nothing here holds state.
//!
//! # Credit model
//!
//! Qualified rest weights time in the crib by how restful it was:
//! actual sleep counts in full, settling and post-wake time count half,
//! and mid-sleep wake intervals earn the credit weight of their
//! [`WakeType`] (quiet 0.5, restless/crying 0).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ValidationError, WakeType};

/// A mid-session wake interval, usually logged after the fact from
/// video review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepCycle {
    pub woke_up_at: DateTime<Utc>,
    /// None while the child is still awake.
    pub fell_back_asleep_at: Option<DateTime<Utc>>,
    pub wake_type: WakeType,
}

impl SleepCycle {
    /// Awake seconds inside `[start, end]`, for closed cycles only.
    ///
    /// Clipping keeps a cycle logged past the session's own wake from
    /// counting time outside the sleep interval.
    fn awake_seconds_within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<i64> {
        self.fell_back_asleep_at.map(|back| {
            let from = self.woke_up_at.max(start);
            let to = back.min(end);
            (to - from).num_seconds().max(0)
        })
    }
}

/// Derived minute totals for a session.
///
/// Each field is `None` until both of its endpoints are known; missing
/// data is never treated as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Durations {
    /// Put-down to out-of-crib.
    pub total_minutes: Option<i64>,
    /// Asleep to wake-up, less mid-sleep wake intervals.
    pub sleep_minutes: Option<i64>,
    /// Put-down to asleep (or the whole stay when the child never slept).
    pub settling_minutes: Option<i64>,
    /// Wake-up to out-of-crib.
    pub post_wake_minutes: Option<i64>,
    /// Settling plus post-wake.
    pub awake_crib_minutes: Option<i64>,
    /// Credit-weighted rest.
    pub qualified_rest_minutes: Option<i64>,
}

/// Validates that cycle intervals do not overlap one another.
///
/// Cycles are compared in chronological order of their wake times; an
/// open cycle extends to infinity, so anything after it overlaps.
pub fn validate_cycles(cycles: &[SleepCycle]) -> Result<(), ValidationError> {
    let mut sorted: Vec<&SleepCycle> = cycles.iter().collect();
    sorted.sort_by_key(|c| c.woke_up_at);
    for (index, pair) in sorted.windows(2).enumerate() {
        let earlier_end = pair[0].fell_back_asleep_at;
        match earlier_end {
            Some(end) if pair[1].woke_up_at >= end => {}
            _ => return Err(ValidationError::OverlappingCycles { index: index + 1 }),
        }
    }
    Ok(())
}

/// Computes all derived durations from the session's timestamps and
/// wake cycles.
///
/// Results are rounded to the nearest whole minute and clamped at zero.
/// Cycles whose wake time precedes `asleep_at` are pre-sleep events
/// (crying while settling) and never reduce sleep time; closed cycles
/// only count the part of their span inside the sleep interval. Open
/// cycles (no fall-back-asleep time) neither reduce sleep nor earn
/// credit; their wake interval is accounted for by the session's own
/// wake-up.
#[must_use]
pub fn compute_durations(
    put_down_at: Option<DateTime<Utc>>,
    asleep_at: Option<DateTime<Utc>>,
    woke_up_at: Option<DateTime<Utc>>,
    out_of_crib_at: Option<DateTime<Utc>>,
    cycles: &[SleepCycle],
) -> Durations {
    let total_seconds = span_seconds(put_down_at, out_of_crib_at);

    // Settling ends at asleep; a child who never slept was settling the
    // whole stay.
    let settling_seconds = match (asleep_at, total_seconds) {
        (Some(asleep), _) => span_seconds(put_down_at, Some(asleep)),
        (None, Some(total)) => Some(total),
        (None, None) => None,
    };

    let post_wake_seconds = span_seconds(woke_up_at, out_of_crib_at);

    // Mid-sleep wake intervals: at or after the recorded asleep time.
    // A cycle ending exactly at asleep_at started before it and is
    // pre-sleep; comparing wake times keeps it out of the reduction.
    let mid_sleep: Vec<&SleepCycle> = asleep_at.map_or_else(Vec::new, |asleep| {
        cycles.iter().filter(|c| c.woke_up_at >= asleep).collect()
    });

    let sleep_bounds = asleep_at.zip(woke_up_at);
    let sleep_seconds = sleep_bounds.map(|(asleep, woke)| {
        let base = (woke - asleep).num_seconds().max(0);
        let interrupted: i64 = mid_sleep
            .iter()
            .filter_map(|c| c.awake_seconds_within(asleep, woke))
            .sum();
        (base - interrupted).max(0)
    });

    let awake_crib_seconds = match (settling_seconds, post_wake_seconds) {
        (Some(s), Some(p)) => Some(s + p),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    };

    let qualified_seconds = if asleep_at.is_none() {
        // Never fell asleep: half credit for the whole stay.
        total_seconds.map(|total| total as f64 * 0.5)
    } else {
        sleep_bounds.zip(sleep_seconds).map(|((asleep, woke), sleep)| {
            let cycle_credit: f64 = mid_sleep
                .iter()
                .filter_map(|c| {
                    c.awake_seconds_within(asleep, woke)
                        .map(|secs| secs as f64 * c.wake_type.credit_weight())
                })
                .sum();
            sleep as f64
                + settling_seconds.unwrap_or(0) as f64 * 0.5
                + post_wake_seconds.unwrap_or(0) as f64 * 0.5
                + cycle_credit
        })
    };

    Durations {
        total_minutes: total_seconds.map(round_minutes),
        sleep_minutes: sleep_seconds.map(round_minutes),
        settling_minutes: settling_seconds.map(round_minutes),
        post_wake_minutes: post_wake_seconds.map(round_minutes),
        awake_crib_minutes: awake_crib_seconds.map(round_minutes),
        qualified_rest_minutes: qualified_seconds.map(round_minutes_f64),
    }
}

/// Seconds between two optional endpoints, clamped at zero.
fn span_seconds(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<i64> {
    match (start, end) {
        (Some(start), Some(end)) => Some((end - start).num_seconds().max(0)),
        _ => None,
    }
}

fn round_minutes(seconds: i64) -> i64 {
    round_minutes_f64(seconds as f64)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "session spans are far below i64 minute overflow"
)]
fn round_minutes_f64(seconds: f64) -> i64 {
    ((seconds / 60.0).round() as i64).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0)
            .single()
            .expect("valid test timestamp")
    }

    fn cycle(
        woke: DateTime<Utc>,
        back: Option<DateTime<Utc>>,
        wake_type: WakeType,
    ) -> SleepCycle {
        SleepCycle {
            woke_up_at: woke,
            fell_back_asleep_at: back,
            wake_type,
        }
    }

    #[test]
    fn full_session_without_cycles() {
        let d = compute_durations(
            Some(at(13, 0)),
            Some(at(13, 10)),
            Some(at(14, 30)),
            Some(at(14, 45)),
            &[],
        );
        assert_eq!(d.total_minutes, Some(105));
        assert_eq!(d.settling_minutes, Some(10));
        assert_eq!(d.sleep_minutes, Some(80));
        assert_eq!(d.post_wake_minutes, Some(15));
        assert_eq!(d.awake_crib_minutes, Some(25));
        // 80 + 5 + 7.5 -> 93 after rounding
        assert_eq!(d.qualified_rest_minutes, Some(93));
    }

    #[test]
    fn no_endpoints_yields_all_unknown() {
        let d = compute_durations(None, None, None, None, &[]);
        assert_eq!(d, Durations::default());
    }

    #[test]
    fn pending_session_has_no_derived_values() {
        // Only put down so far: nothing is computable yet, and nothing
        // is silently treated as zero.
        let d = compute_durations(Some(at(9, 0)), None, None, None, &[]);
        assert_eq!(d.total_minutes, None);
        assert_eq!(d.settling_minutes, None);
        assert_eq!(d.sleep_minutes, None);
        assert_eq!(d.qualified_rest_minutes, None);
    }

    #[test]
    fn never_slept_settling_equals_total() {
        // Put down 14:00, out of crib 14:30, never fell asleep.
        let d = compute_durations(Some(at(14, 0)), None, None, Some(at(14, 30)), &[]);
        assert_eq!(d.total_minutes, Some(30));
        assert_eq!(d.settling_minutes, Some(30));
        assert_eq!(d.sleep_minutes, None);
        assert_eq!(d.post_wake_minutes, None);
        assert_eq!(d.awake_crib_minutes, Some(30));
        assert_eq!(d.qualified_rest_minutes, Some(15));
    }

    #[test]
    fn pre_sleep_cry_cycle_does_not_reduce_sleep() {
        // Crying 09:21-09:36 while still settling; asleep recorded at
        // 09:36. The cycle's wake precedes asleep_at so sleep must stay
        // positive.
        let cycles = vec![cycle(at(9, 21), Some(at(9, 36)), WakeType::Crying)];
        let d = compute_durations(
            Some(at(8, 55)),
            Some(at(9, 36)),
            Some(at(9, 50)),
            Some(at(10, 21)),
            &cycles,
        );
        assert_eq!(d.settling_minutes, Some(41));
        assert_eq!(d.sleep_minutes, Some(14));
        assert_eq!(d.post_wake_minutes, Some(31));
        assert_eq!(d.total_minutes, Some(86));
    }

    #[test]
    fn mid_sleep_cycle_reduces_sleep() {
        let cycles = vec![cycle(at(13, 30), Some(at(13, 40)), WakeType::Crying)];
        let d = compute_durations(
            Some(at(13, 0)),
            Some(at(13, 0)),
            Some(at(14, 0)),
            Some(at(14, 0)),
            &cycles,
        );
        assert_eq!(d.sleep_minutes, Some(50));
    }

    #[test]
    fn wake_type_determines_cycle_credit() {
        // sleep 40 (50 base - 10 cycle), settling 10, post-wake 10.
        let run = |wake_type| {
            let cycles = vec![cycle(at(13, 30), Some(at(13, 40)), wake_type)];
            compute_durations(
                Some(at(13, 0)),
                Some(at(13, 10)),
                Some(at(14, 0)),
                Some(at(14, 10)),
                &cycles,
            )
        };
        let crying = run(WakeType::Crying);
        assert_eq!(crying.sleep_minutes, Some(40));
        assert_eq!(crying.qualified_rest_minutes, Some(50));

        let restless = run(WakeType::Restless);
        assert_eq!(restless.qualified_rest_minutes, Some(50));

        let quiet = run(WakeType::Quiet);
        assert_eq!(quiet.qualified_rest_minutes, Some(55));
    }

    #[test]
    fn open_cycle_is_ignored() {
        let cycles = vec![cycle(at(13, 30), None, WakeType::Quiet)];
        let d = compute_durations(
            Some(at(13, 0)),
            Some(at(13, 0)),
            Some(at(14, 0)),
            Some(at(14, 0)),
            &cycles,
        );
        assert_eq!(d.sleep_minutes, Some(60));
        assert_eq!(d.qualified_rest_minutes, Some(60));
    }

    #[test]
    fn adhoc_session_with_only_sleep_endpoints() {
        // Car nap: no put-down or out-of-crib times.
        let d = compute_durations(None, Some(at(11, 0)), Some(at(11, 45)), None, &[]);
        assert_eq!(d.total_minutes, None);
        assert_eq!(d.sleep_minutes, Some(45));
        assert_eq!(d.settling_minutes, None);
        assert_eq!(d.qualified_rest_minutes, Some(45));
    }

    #[test]
    fn zero_length_session_degrades_to_zero() {
        let d = compute_durations(
            Some(at(13, 0)),
            Some(at(13, 0)),
            Some(at(13, 0)),
            Some(at(13, 0)),
            &[],
        );
        assert_eq!(d.total_minutes, Some(0));
        assert_eq!(d.sleep_minutes, Some(0));
        assert_eq!(d.qualified_rest_minutes, Some(0));
    }

    #[test]
    fn durations_never_negative() {
        // Out-of-order inputs clamp to zero rather than going negative.
        let cycles = vec![cycle(at(13, 0), Some(at(14, 30)), WakeType::Crying)];
        let d = compute_durations(
            Some(at(13, 0)),
            Some(at(13, 0)),
            Some(at(13, 30)),
            Some(at(13, 30)),
            &cycles,
        );
        for value in [
            d.total_minutes,
            d.sleep_minutes,
            d.settling_minutes,
            d.post_wake_minutes,
            d.awake_crib_minutes,
            d.qualified_rest_minutes,
        ] {
            assert!(value.unwrap_or(0) >= 0);
        }
    }

    #[test]
    fn cycle_past_session_wake_is_clipped() {
        // Quiet cycle logged 13:00-14:30 against a sleep interval of
        // only 13:00-13:30; neither the reduction nor the credit may
        // count the hour past the session's wake.
        let cycles = vec![cycle(at(13, 0), Some(at(14, 30)), WakeType::Quiet)];
        let d = compute_durations(
            Some(at(13, 0)),
            Some(at(13, 0)),
            Some(at(13, 30)),
            Some(at(13, 30)),
            &cycles,
        );
        assert_eq!(d.total_minutes, Some(30));
        assert_eq!(d.sleep_minutes, Some(0));
        // 0 sleep + 30 clipped quiet minutes at half credit.
        assert_eq!(d.qualified_rest_minutes, Some(15));
    }

    #[test]
    fn qualified_rest_never_exceeds_total() {
        let cases = [
            (
                Some(at(13, 0)),
                Some(at(13, 10)),
                Some(at(14, 0)),
                Some(at(14, 10)),
                vec![cycle(at(13, 30), Some(at(13, 40)), WakeType::Quiet)],
            ),
            (Some(at(14, 0)), None, None, Some(at(14, 30)), vec![]),
            (
                Some(at(8, 55)),
                Some(at(9, 36)),
                Some(at(9, 50)),
                Some(at(10, 21)),
                vec![cycle(at(9, 21), Some(at(9, 36)), WakeType::Crying)],
            ),
            (
                Some(at(13, 0)),
                Some(at(13, 0)),
                Some(at(13, 30)),
                Some(at(13, 30)),
                vec![cycle(at(13, 0), Some(at(14, 30)), WakeType::Quiet)],
            ),
        ];
        for (put, asleep, woke, out, cycles) in cases {
            let d = compute_durations(put, asleep, woke, out, &cycles);
            if let (Some(q), Some(t)) = (d.qualified_rest_minutes, d.total_minutes) {
                assert!(q <= t, "qualified {q} exceeded total {t}");
            }
        }
    }

    #[test]
    fn rounding_is_to_nearest_minute() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 10, 13, 10, 31).unwrap();
        let d = compute_durations(Some(start), None, None, Some(end), &[]);
        assert_eq!(d.total_minutes, Some(11));
    }

    #[test]
    fn validate_cycles_accepts_disjoint() {
        let cycles = vec![
            cycle(at(13, 0), Some(at(13, 10)), WakeType::Quiet),
            cycle(at(13, 20), Some(at(13, 30)), WakeType::Crying),
        ];
        assert!(validate_cycles(&cycles).is_ok());
    }

    #[test]
    fn validate_cycles_rejects_overlap() {
        let cycles = vec![
            cycle(at(13, 0), Some(at(13, 20)), WakeType::Quiet),
            cycle(at(13, 10), Some(at(13, 30)), WakeType::Crying),
        ];
        assert!(matches!(
            validate_cycles(&cycles),
            Err(ValidationError::OverlappingCycles { .. })
        ));
    }

    #[test]
    fn validate_cycles_rejects_anything_after_open_cycle() {
        let cycles = vec![
            cycle(at(13, 0), None, WakeType::Quiet),
            cycle(at(13, 30), Some(at(13, 40)), WakeType::Crying),
        ];
        assert!(validate_cycles(&cycles).is_err());
    }
}
