//! Read-only views over a class list: what is on today, what comes next, and
//! the week at a glance.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::clock::{WEEKDAYS, weekday_name};
use crate::models::ClassEntry;

#[derive(Debug, Clone, Serialize)]
pub struct NextClass {
    pub class: ClassEntry,
    pub starts_in_minutes: i64,
    /// `"<h>h <m>m"`
    pub countdown: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TodaySummary {
    pub today: String,
    pub date: String,
    pub total_classes: usize,
    pub todays_classes: usize,
    pub upcoming_today: usize,
    pub next_class: Option<NextClass>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySchedule {
    pub day: String,
    pub classes: Vec<ClassEntry>,
}

fn start_minute(entry: &ClassEntry) -> Option<i64> {
    entry
        .parsed_start_time()
        .map(|t| i64::from(t.hour()) * 60 + i64::from(t.minute()))
}

/// Classes held on `weekday`, earliest first; unreadable start times sort last.
pub fn todays_classes<'a>(entries: &'a [ClassEntry], weekday: &str) -> Vec<&'a ClassEntry> {
    let mut today: Vec<&ClassEntry> = entries.iter().filter(|e| e.occurs_on(weekday)).collect();
    today.sort_by_key(|e| start_minute(e).unwrap_or(i64::MAX));
    today
}

/// Today's classes starting after the current minute.
pub fn upcoming_today<'a>(entries: &'a [ClassEntry], now: NaiveDateTime) -> Vec<&'a ClassEntry> {
    let current = i64::from(now.hour()) * 60 + i64::from(now.minute());
    todays_classes(entries, weekday_name(now.weekday()))
        .into_iter()
        .filter(|e| start_minute(e).is_some_and(|m| m > current))
        .collect()
}

pub fn format_countdown(minutes: i64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub fn next_class(entries: &[ClassEntry], now: NaiveDateTime) -> Option<NextClass> {
    let current = i64::from(now.hour()) * 60 + i64::from(now.minute());
    let next = upcoming_today(entries, now).into_iter().next()?;
    let starts_in_minutes = start_minute(next)? - current;
    Some(NextClass {
        class: next.clone(),
        starts_in_minutes,
        countdown: format_countdown(starts_in_minutes),
    })
}

pub fn today_summary(entries: &[ClassEntry], now: NaiveDateTime) -> TodaySummary {
    let today = weekday_name(now.weekday());
    TodaySummary {
        today: today.to_string(),
        date: now.format("%Y-%m-%d").to_string(),
        total_classes: entries.len(),
        todays_classes: todays_classes(entries, today).len(),
        upcoming_today: upcoming_today(entries, now).len(),
        next_class: next_class(entries, now),
    }
}

/// Case-insensitive name search plus an optional day (`"All"` or absent means every day).
pub fn filter_classes(entries: &[ClassEntry], search: Option<&str>, day: Option<&str>) -> Vec<ClassEntry> {
    let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
    let day = day.map(str::trim).filter(|d| !d.is_empty() && *d != "All");
    entries
        .iter()
        .filter(|e| e.name.to_lowercase().contains(&needle))
        .filter(|e| day.is_none_or(|d| e.occurs_on(d)))
        .cloned()
        .collect()
}

/// Monday through Sunday, each day's classes ordered by start time.
pub fn weekly_timetable(entries: &[ClassEntry]) -> Vec<DaySchedule> {
    WEEKDAYS
        .iter()
        .map(|day| {
            let mut classes: Vec<ClassEntry> =
                entries.iter().filter(|e| e.occurs_on(day)).cloned().collect();
            classes.sort_by(|a, b| a.start_time.cmp(&b.start_time));
            DaySchedule {
                day: day.to_string(),
                classes,
            }
        })
        .collect()
}
