use chrono::{DateTime, Utc};

/// Time source for anything that needs the current instant.
///
/// Everything time-sensitive (throttle windows, batch-number day rollover,
/// completion timestamps) takes an `Arc<dyn Clock>` instead of calling
/// `Utc::now()` directly, so tests can drive the clock by hand.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Default)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Start the clock at the given instant.
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(start),
        }
    }

    /// Advance the clock by a number of seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::seconds(secs);
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let start = "2024-05-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let clock = ManualClock::at(start);
        assert_eq!(clock.now(), start);

        clock.advance_secs(90);
        assert_eq!(clock.now(), start + chrono::Duration::seconds(90));
    }

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
