//! SRS (Spaced Repetition System) library for Recall
//!
//! This crate provides the SM-2 scheduling rule and the date arithmetic the
//! review scheduler builds on. It performs no I/O: every function that needs
//! the current time takes it as an argument.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ease factor assigned to a freshly assigned item.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Lower bound for the ease factor. There is no upper bound.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Lowest quality rating that counts as a successful recall.
pub const PASSING_QUALITY: u8 = 3;

/// Highest quality rating.
pub const MAX_QUALITY: u8 = 5;

/// A quality rating outside the closed integer domain `[0, 5]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("quality must be an integer between 0 and 5, got {0}")]
pub struct InvalidQuality(pub String);

/// A validated recall-quality rating.
///
/// `0` is a complete blackout, `5` a perfect, effortless recall. Anything
/// below [`PASSING_QUALITY`] is a lapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// The raw rating, always in `0..=5`.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether the rating counts as a correct answer (`quality >= 3`).
    pub const fn is_success(self) -> bool {
        self.0 >= PASSING_QUALITY
    }
}

impl TryFrom<i64> for Quality {
    type Error = InvalidQuality;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(q) if q <= MAX_QUALITY => Ok(Self(q)),
            _ => Err(InvalidQuality(value.to_string())),
        }
    }
}

impl TryFrom<f64> for Quality {
    type Error = InvalidQuality;

    /// Accepts integral floats such as `4.0`; rejects `3.5`, NaN and infinities.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(InvalidQuality(value.to_string()));
        }
        if !(0.0..=f64::from(MAX_QUALITY)).contains(&value) {
            return Err(InvalidQuality(value.to_string()));
        }
        // Range checked above, the cast is exact.
        Ok(Self(value as u8))
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// The part of an item's state the SM-2 rule reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Interval growth multiplier, never below [`MIN_EASE_FACTOR`]
    pub ease_factor: f64,
    /// Days until the next review, `0` only before the first review
    pub interval_days: i32,
    /// Consecutive successful reviews
    pub repetitions: i32,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new_item()
    }
}

impl Schedule {
    /// State of an item that has never been reviewed.
    pub const fn new_item() -> Self {
        Self {
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: 0,
            repetitions: 0,
        }
    }

    /// Apply one review to this schedule.
    ///
    /// # Arguments
    ///
    /// * `quality` - The recall-quality rating given by the learner
    ///
    /// # Returns
    ///
    /// The schedule after the review
    ///
    /// # Algorithm
    ///
    /// * Lapse (`quality < 3`): repetitions reset to 0, interval reset to 1 day
    /// * Success: repetitions incremented, then the interval becomes
    ///   * 1 day after the first success in a row
    ///   * 6 days after the second
    ///   * `round(interval * ease_factor)` afterwards, using the ease factor
    ///     held *before* this review
    /// * The ease factor is updated on every review with
    ///   `EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))`,
    ///   floored at 1.3
    pub fn review(&self, quality: Quality) -> Self {
        let (repetitions, interval_days) = if quality.is_success() {
            let repetitions = self.repetitions.saturating_add(1);
            let interval_days = match repetitions {
                1 => 1,
                2 => 6,
                _ => grow_interval(self.interval_days, self.ease_factor),
            };
            (repetitions, interval_days)
        } else {
            (0, 1)
        };

        Self {
            ease_factor: next_ease_factor(self.ease_factor, quality),
            interval_days,
            repetitions,
        }
    }

    /// When an item reviewed at `reviewed_at` with this schedule is next due.
    ///
    /// Saturates at the latest representable instant instead of overflowing.
    pub fn next_review_at(&self, reviewed_at: DateTime<Utc>) -> DateTime<Utc> {
        reviewed_at
            .checked_add_signed(Duration::days(i64::from(self.interval_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Change applied to the ease factor for a given quality, before clamping.
///
/// | quality | delta |
/// |---|---|
/// | 5 | +0.10 |
/// | 4 | 0.00 |
/// | 3 | -0.14 |
/// | 2 | -0.32 |
/// | 1 | -0.54 |
/// | 0 | -0.80 |
pub fn ease_delta(quality: Quality) -> f64 {
    let miss = f64::from(MAX_QUALITY - quality.value());
    0.1 - miss * (0.08 + miss * 0.02)
}

/// Compute the ease factor after a review, floored at [`MIN_EASE_FACTOR`].
pub fn next_ease_factor(ease_factor: f64, quality: Quality) -> f64 {
    (ease_factor + ease_delta(quality)).max(MIN_EASE_FACTOR)
}

fn grow_interval(interval_days: i32, ease_factor: f64) -> i32 {
    // `as` saturates on overflow
    let grown = (f64::from(interval_days) * ease_factor).round() as i32;
    grown.max(1)
}

/// Whether an item scheduled for `next_review_at` is due at `as_of`.
pub fn is_due(next_review_at: DateTime<Utc>, as_of: DateTime<Utc>) -> bool {
    next_review_at <= as_of
}

/// Whole days an item is past its review time, never negative.
///
/// `0` when the item is due exactly at `as_of` or not yet due.
pub fn days_overdue(next_review_at: DateTime<Utc>, as_of: DateTime<Utc>) -> i64 {
    as_of
        .signed_duration_since(next_review_at)
        .num_days()
        .max(0)
}

/// Midnight (UTC) of the day containing `at`.
pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Share of successful reviews, `0.0` when there were none.
pub fn retention_rate(successful: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    successful as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn q(value: i64) -> Quality {
        Quality::try_from(value).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_quality_domain() {
        for value in 0..=5 {
            assert_eq!(q(value).value(), value as u8);
        }
        assert!(Quality::try_from(-1_i64).is_err());
        assert!(Quality::try_from(6_i64).is_err());
        assert!(Quality::try_from(i64::MAX).is_err());

        assert_eq!(Quality::try_from(4.0).unwrap(), q(4));
        assert!(Quality::try_from(3.5).is_err());
        assert!(Quality::try_from(f64::NAN).is_err());
        assert!(Quality::try_from(5.000_001).is_err());
        assert!(Quality::try_from(-0.5).is_err());
    }

    #[test]
    fn test_quality_success_threshold() {
        assert!(!q(0).is_success());
        assert!(!q(2).is_success());
        assert!(q(3).is_success());
        assert!(q(5).is_success());
    }

    #[test]
    fn test_ease_delta_table() {
        assert!(approx(ease_delta(q(5)), 0.1));
        assert!(approx(ease_delta(q(4)), 0.0));
        assert!(approx(ease_delta(q(3)), -0.14));
        assert!(approx(ease_delta(q(2)), -0.32));
        assert!(approx(ease_delta(q(1)), -0.54));
        assert!(approx(ease_delta(q(0)), -0.8));
    }

    #[test]
    fn test_new_item_defaults() {
        let schedule = Schedule::new_item();
        assert!(approx(schedule.ease_factor, INITIAL_EASE_FACTOR));
        assert_eq!(schedule.interval_days, 0);
        assert_eq!(schedule.repetitions, 0);
    }

    #[test]
    fn test_growth_schedule() {
        let first = Schedule::new_item().review(q(5));
        assert_eq!(first.interval_days, 1);
        assert_eq!(first.repetitions, 1);

        let second = first.review(q(5));
        assert_eq!(second.interval_days, 6);
        assert_eq!(second.repetitions, 2);

        let third = second.review(q(5));
        assert_eq!(third.repetitions, 3);
        assert_eq!(
            third.interval_days,
            (6.0 * second.ease_factor).round() as i32
        );
        assert_eq!(third.interval_days, 16); // 6 * 2.7 = 16.2
    }

    #[test]
    fn test_concrete_scenario() {
        let first = Schedule::new_item().review(q(5));
        assert_eq!((first.repetitions, first.interval_days), (1, 1));
        assert!(approx(first.ease_factor, 2.6));

        let second = first.review(q(5));
        assert_eq!((second.repetitions, second.interval_days), (2, 6));
        assert!(approx(second.ease_factor, 2.7));

        let lapse = second.review(q(2));
        assert_eq!((lapse.repetitions, lapse.interval_days), (0, 1));
        assert!(lapse.ease_factor < second.ease_factor);
        assert!(approx(lapse.ease_factor, 2.38));
    }

    #[test]
    fn test_lapse_resets_any_streak() {
        for streak in [1, 2, 3, 10, 250] {
            let schedule = Schedule {
                ease_factor: 2.2,
                interval_days: 400,
                repetitions: streak,
            };
            for quality in 0..3 {
                let next = schedule.review(q(quality));
                assert_eq!(next.repetitions, 0);
                assert_eq!(next.interval_days, 1);
            }
        }
    }

    #[test]
    fn test_ease_factor_floor() {
        let mut schedule = Schedule::new_item();
        for _ in 0..50 {
            schedule = schedule.review(q(0));
            assert!(schedule.ease_factor >= MIN_EASE_FACTOR);
        }
        assert!(approx(schedule.ease_factor, MIN_EASE_FACTOR));

        // Quality 3 shrinks the factor too, even though it is a success
        let mut schedule = Schedule::new_item();
        for _ in 0..20 {
            schedule = schedule.review(q(3));
            assert!(schedule.ease_factor >= MIN_EASE_FACTOR);
        }
        assert!(approx(schedule.ease_factor, MIN_EASE_FACTOR));
    }

    #[test]
    fn test_ease_factor_has_no_ceiling() {
        let mut schedule = Schedule::new_item();
        for _ in 0..30 {
            schedule = schedule.review(q(5));
        }
        assert!(approx(schedule.ease_factor, 2.5 + 30.0 * 0.1));
    }

    #[test]
    fn test_interval_uses_ease_before_update() {
        let schedule = Schedule {
            ease_factor: 2.0,
            interval_days: 10,
            repetitions: 4,
        };
        // Quality 3 lowers the factor to 1.86, but growth uses 2.0
        let next = schedule.review(q(3));
        assert_eq!(next.interval_days, 20);
        assert!(approx(next.ease_factor, 1.86));
    }

    #[test]
    fn test_interval_rounding() {
        let schedule = Schedule {
            ease_factor: 1.3,
            interval_days: 5,
            repetitions: 3,
        };
        // 5 * 1.3 = 6.5 rounds half away from zero
        assert_eq!(schedule.review(q(4)).interval_days, 7);
    }

    #[test]
    fn test_next_review_at() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let schedule = Schedule {
            ease_factor: 2.5,
            interval_days: 6,
            repetitions: 2,
        };
        assert_eq!(
            schedule.next_review_at(now),
            Utc.with_ymd_and_hms(2024, 3, 7, 9, 30, 0).unwrap()
        );

        let huge = Schedule {
            ease_factor: 2.5,
            interval_days: i32::MAX,
            repetitions: 40,
        };
        assert_eq!(huge.next_review_at(now), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_days_overdue() {
        let as_of = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();

        assert_eq!(days_overdue(as_of, as_of), 0);
        assert_eq!(days_overdue(as_of - Duration::hours(23), as_of), 0);
        assert_eq!(days_overdue(as_of - Duration::hours(24), as_of), 1);
        assert_eq!(days_overdue(as_of - Duration::hours(71), as_of), 2);
        // Not yet due never goes negative
        assert_eq!(days_overdue(as_of + Duration::days(3), as_of), 0);
    }

    #[test]
    fn test_is_due() {
        let as_of = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        assert!(is_due(as_of, as_of));
        assert!(is_due(as_of - Duration::seconds(1), as_of));
        assert!(!is_due(as_of + Duration::seconds(1), as_of));
    }

    #[test]
    fn test_start_of_day() {
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap();
        assert_eq!(
            start_of_day(at),
            Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()
        );
        let midnight = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(start_of_day(midnight), midnight);
    }

    #[test]
    fn test_retention_rate() {
        assert_eq!(retention_rate(0, 0), 0.0);
        assert!(!retention_rate(0, 0).is_nan());
        assert!(approx(retention_rate(3, 4), 0.75));
        assert!(approx(retention_rate(5, 5), 1.0));
        assert_eq!(retention_rate(0, 7), 0.0);
    }

    #[test]
    fn test_quality_serde() {
        let quality: Quality = serde_json::from_str("4").unwrap();
        assert_eq!(quality, q(4));
        assert!(serde_json::from_str::<Quality>("9").is_err());
        assert_eq!(serde_json::to_string(&quality).unwrap(), "4");
    }
}
