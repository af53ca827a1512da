//! Wall-clock access anchored to the reference timezone.
//!
//! "Today" and the daily fire instant are always computed in one fixed
//! offset (Moscow time by default), never in the host's local zone.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use parking_lot::Mutex;

/// UTC+03:00
pub const MOSCOW_OFFSET_SECS: i32 = 3 * 3600;

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Default reference timezone (Europe/Moscow has no DST)
pub fn moscow_offset() -> FixedOffset {
    FixedOffset::east_opt(MOSCOW_OFFSET_SECS).expect("UTC+3 is a valid offset")
}

/// Calendar date of `now` in the reference timezone
pub fn reference_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}
