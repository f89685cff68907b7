use std::sync::Mutex;

use chrono::{Datelike, Duration, Local, NaiveDateTime, Weekday};

/// Weekday names as stored in `ClassEntry::days`, Monday first.
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub fn weekday_name(day: Weekday) -> &'static str {
    WEEKDAYS[day.num_days_from_monday() as usize]
}

/// One clock read with the values derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockReading {
    pub now: NaiveDateTime,
    pub weekday: &'static str,
    /// `YYYY-MM-DD`
    pub date: String,
}

/// Source of local wall-clock time. No UTC normalisation happens anywhere.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// Instant, weekday and date from a single read, so they never straddle midnight.
    fn read(&self) -> ClockReading {
        let now = self.now();
        ClockReading {
            now,
            weekday: weekday_name(now.weekday()),
            date: now.format("%Y-%m-%d").to_string(),
        }
    }

    fn today_weekday_name(&self) -> &'static str {
        self.read().weekday
    }

    fn today_date_string(&self) -> String {
        self.read().date
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
