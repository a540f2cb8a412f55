//! Time source for the store.
//!
//! Timestamps drive note ordering and id generation, so tests swap in a
//! [`ManualClock`] instead of reading the system time.
use std::{cell::Cell, rc::Rc};

use chrono::{DateTime, Duration, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Hands out creation-time-derived ids that never repeat.
///
/// An id is the millisecond timestamp of its creation. Two ids requested in
/// the same millisecond (or after the clock steps backwards) get bumped past
/// the last one issued.
#[derive(Debug, Default)]
pub(crate) struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    /// Starts after the largest numeric id already in use.
    pub(crate) fn resume_after<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let last = ids
            .into_iter()
            .filter_map(|id| id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        IdGenerator { last }
    }

    pub(crate) fn next(&mut self, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis().max(self.last + 1);
        self.last = millis;
        millis.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let other = clock.clone();

        clock.advance(Duration::minutes(5));
        assert_eq!(other.now(), start + Duration::minutes(5));
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut ids = IdGenerator::default();

        let a = ids.next(now);
        let b = ids.next(now);
        assert_eq!(a, now.timestamp_millis().to_string());
        assert_eq!(b, (now.timestamp_millis() + 1).to_string());
    }

    #[test]
    fn test_resume_skips_existing_ids() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let future = (now.timestamp_millis() + 50).to_string();
        let mut ids = IdGenerator::resume_after(["legacy-id", future.as_str()]);

        assert_eq!(ids.next(now), (now.timestamp_millis() + 51).to_string());
    }
}
