//! Countdown arithmetic for time-limited discounts.
//!
//! The storefront shows how long a sale has left. The value is recomputed
//! from a fixed end timestamp on every tick rather than decremented, so a
//! late tick never drifts.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// Time left until a countdown ends, split into display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimeRemaining {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeRemaining {
    /// Split a number of seconds into days/hours/minutes/seconds.
    #[must_use]
    pub const fn from_seconds(total: u64) -> Self {
        Self {
            days: total / SECONDS_PER_DAY,
            hours: (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
            minutes: (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            seconds: total % SECONDS_PER_MINUTE,
        }
    }

    /// Total seconds remaining.
    #[must_use]
    pub const fn total_seconds(&self) -> u64 {
        self.days * SECONDS_PER_DAY
            + self.hours * SECONDS_PER_HOUR
            + self.minutes * SECONDS_PER_MINUTE
            + self.seconds
    }

    /// Whether the countdown has reached zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.total_seconds() == 0
    }
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}d ", self.days)?;
        }
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

/// A countdown to a fixed instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    ends_at: DateTime<Utc>,
}

impl Countdown {
    /// Create a countdown ending at `ends_at`.
    #[must_use]
    pub const fn new(ends_at: DateTime<Utc>) -> Self {
        Self { ends_at }
    }

    /// The instant the countdown ends.
    #[must_use]
    pub const fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    /// Time remaining at `now`, saturating at zero.
    ///
    /// Partial seconds round up, so the value is zero exactly when
    /// [`is_expired_at`](Self::is_expired_at) holds.
    #[must_use]
    pub fn remaining_at(&self, now: DateTime<Utc>) -> TimeRemaining {
        let millis = u64::try_from((self.ends_at - now).num_milliseconds()).unwrap_or(0);
        TimeRemaining::from_seconds(millis.div_ceil(1000))
    }

    /// Whether the countdown has ended at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, h, m, s).single().unwrap_or_default()
    }

    #[test]
    fn test_from_seconds_splits_units() {
        let remaining = TimeRemaining::from_seconds(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5);
        assert_eq!(
            remaining,
            TimeRemaining {
                days: 2,
                hours: 3,
                minutes: 4,
                seconds: 5
            }
        );
        assert_eq!(remaining.to_string(), "2d 03:04:05");
        assert_eq!(remaining.total_seconds(), 183_845);
    }

    #[test]
    fn test_display_under_a_day() {
        assert_eq!(TimeRemaining::from_seconds(59).to_string(), "00:00:59");
    }

    #[test]
    fn test_remaining_counts_down() {
        let countdown = Countdown::new(at(12, 0, 0));
        assert_eq!(countdown.remaining_at(at(11, 59, 0)).total_seconds(), 60);
        assert_eq!(
            countdown
                .remaining_at(at(11, 59, 0) + Duration::milliseconds(500))
                .total_seconds(),
            60
        );
        assert_eq!(countdown.remaining_at(at(11, 59, 1)).total_seconds(), 59);
        assert!(!countdown.is_expired_at(at(11, 59, 59)));
    }

    #[test]
    fn test_saturates_at_zero_after_end() {
        let countdown = Countdown::new(at(12, 0, 0));
        assert!(countdown.remaining_at(at(12, 0, 0)).is_zero());
        assert!(countdown.remaining_at(at(13, 0, 0)).is_zero());
        assert!(countdown.is_expired_at(at(12, 0, 0)));
    }

    #[test]
    fn test_zero_only_once_expired() {
        let end = at(12, 0, 0);
        let countdown = Countdown::new(end);

        for millis in [900, 500, 1, 0] {
            let now = end - Duration::milliseconds(millis);
            let remaining = countdown.remaining_at(now);
            assert_eq!(remaining.is_zero(), countdown.is_expired_at(now), "{millis}ms left");
        }
        assert_eq!(
            countdown
                .remaining_at(end - Duration::milliseconds(1))
                .total_seconds(),
            1
        );
    }
}
