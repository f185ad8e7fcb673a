//! Live countdown ticker.

use std::time::Duration;

use chrono::Utc;
use futures::Stream;
use tokio::time::MissedTickBehavior;

use marketfront_core::{Countdown, TimeRemaining};

/// Interval between ticks on discount pages.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Time remaining, once per `period`, until the countdown ends.
///
/// The first value is yielded immediately. The stream yields a zero value
/// exactly once and then ends, so consumers fire their "expired" handling a
/// single time.
pub fn ticker(countdown: Countdown, period: Duration) -> impl Stream<Item = TimeRemaining> {
    async_stream::stream! {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let remaining = countdown.remaining_at(Utc::now());
            yield remaining;
            if remaining.is_zero() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn test_expired_countdown_yields_zero_once() {
        let countdown = Countdown::new(Utc::now() - TimeDelta::seconds(5));
        let ticks: Vec<_> = ticker(countdown, Duration::from_millis(10)).collect().await;
        assert_eq!(ticks.len(), 1);
        assert!(ticks[0].is_zero());
    }

    #[tokio::test]
    async fn test_ticker_ends_after_expiry() {
        let countdown = Countdown::new(Utc::now() + TimeDelta::milliseconds(1200));
        let ticks: Vec<_> = ticker(countdown, Duration::from_millis(200)).collect().await;

        assert!(ticks.len() >= 2);
        assert!(ticks.last().is_some_and(TimeRemaining::is_zero));
        assert_eq!(ticks.iter().filter(|t| t.is_zero()).count(), 1);
        assert!(ticks[0].total_seconds() <= 2);
        // The final zero is never emitted while time is left.
        assert!(Utc::now() >= countdown.ends_at());
    }
}
