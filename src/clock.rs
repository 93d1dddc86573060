// src/clock.rs
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// Wall-clock source for submissions. Local time is used as-is; no timezone
/// normalization happens at this layer.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Everything a form handler needs to know about "now", captured once per
/// submission and passed in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionContext {
    pub now: NaiveDateTime,
    pub late_cutoff: NaiveTime,
}

impl SubmissionContext {
    pub fn capture(clock: &dyn Clock, late_cutoff: NaiveTime) -> Self {
        Self {
            now: clock.now(),
            late_cutoff,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }
}

#[cfg(test)]
#[derive(Clone)]
pub struct TestClock {
    current_time: Arc<Mutex<NaiveDateTime>>,
}

#[cfg(test)]
impl TestClock {
    pub fn new(datetime_str: &str) -> Self {
        let dt = NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S")
            .expect("Failed to parse datetime string in TestClock::new");
        Self {
            current_time: Arc::new(Mutex::new(dt)),
        }
    }

    pub fn set_time(&self, datetime_str: &str) {
        *self.current_time.lock().unwrap() =
            NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S")
                .expect("Failed to parse datetime string in TestClock::set_time");
    }
}

#[cfg(test)]
impl Clock for TestClock {
    fn now(&self) -> NaiveDateTime {
        *self.current_time.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_captures_clock_reading() {
        let clock = TestClock::new("2024-03-04 09:31:00");
        let cutoff = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        let ctx = SubmissionContext::capture(&clock, cutoff);
        assert_eq!(ctx.today(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(ctx.late_cutoff, cutoff);

        clock.set_time("2024-03-05 08:00:00");
        let later = SubmissionContext::capture(&clock, cutoff);
        assert_eq!(later.today(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        // Earlier capture is unaffected
        assert_eq!(ctx.today(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }
}
