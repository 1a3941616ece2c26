//! Timestamp utilities and the injectable clock

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Seconds in one day, the unit of inspection frequency
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time source
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current time as Unix seconds
    fn unix_now(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        now()
    }
}

/// Settable clock for tests, second resolution
#[derive(Debug)]
pub struct FixedClock {
    secs: AtomicI64,
}

impl FixedClock {
    pub fn at(secs: i64) -> Self {
        Self {
            secs: AtomicI64::new(secs),
        }
    }

    pub fn set(&self, secs: i64) {
        self.secs.store(secs, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.secs.fetch_add(by.num_seconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.secs.load(Ordering::SeqCst);
        Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
    }
}

/// Days between two Unix-second timestamps, floored
///
/// Negative when `later` precedes `earlier`.
pub fn whole_days_between(earlier: i64, later: i64) -> i64 {
    (later - earlier).div_euclid(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[test]
    fn test_fixed_clock_set_and_advance() {
        let clock = FixedClock::at(1_000);
        assert_eq!(clock.unix_now(), 1_000);

        clock.advance(Duration::days(2));
        assert_eq!(clock.unix_now(), 1_000 + 2 * SECONDS_PER_DAY);

        clock.set(5);
        assert_eq!(clock.unix_now(), 5);
    }

    #[test]
    fn test_whole_days_between_floors() {
        assert_eq!(whole_days_between(0, SECONDS_PER_DAY - 1), 0);
        assert_eq!(whole_days_between(0, SECONDS_PER_DAY), 1);
        assert_eq!(whole_days_between(0, 45 * SECONDS_PER_DAY + 3_600), 45);
    }

    #[test]
    fn test_whole_days_between_future_baseline_is_negative() {
        assert_eq!(whole_days_between(SECONDS_PER_DAY, 0), -1);
        assert_eq!(whole_days_between(1, 0), -1);
    }
}
