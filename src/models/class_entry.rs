use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::clock::WEEKDAYS;
use crate::error::AppError;

pub const DEFAULT_REMINDER_MINUTES: i64 = 15;
pub const MAX_REMINDER_MINUTES: i64 = 120;

/// A recurring class as stored by the class API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub days: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub reminder_minutes: Option<i64>,
    #[serde(default)]
    pub last_notified_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials: Option<String>,
    /// Server-side fields this crate does not interpret, sent back untouched on update.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClassEntry {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        days: &[&str],
        start_time: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            days: days.iter().map(|d| d.to_string()).collect(),
            start_time: start_time.into(),
            end_time: None,
            venue: None,
            reminder_minutes: None,
            last_notified_date: None,
            notes: None,
            materials: None,
            extra: Map::new(),
        }
    }

    pub fn occurs_on(&self, weekday: &str) -> bool {
        self.days.iter().any(|d| d == weekday)
    }

    /// `Pending` for the day unless a reminder was already recorded for `today_date`.
    pub fn is_pending(&self, today_date: &str) -> bool {
        self.last_notified_date.as_deref() != Some(today_date)
    }

    /// Zero or missing falls back to the default.
    pub fn effective_reminder_minutes(&self) -> i64 {
        match self.reminder_minutes {
            Some(m) if m != 0 => m,
            _ => DEFAULT_REMINDER_MINUTES,
        }
    }

    pub fn parsed_start_time(&self) -> Option<NaiveTime> {
        parse_clock_time(&self.start_time)
    }

    pub fn venue(&self) -> Option<&str> {
        self.venue.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }
        if self.parsed_start_time().is_none() {
            return Err(AppError::Validation(format!(
                "start time {:?} is not HH:MM",
                self.start_time
            )));
        }
        if self.days.is_empty() {
            return Err(AppError::Validation("at least one day is required".to_string()));
        }
        if let Some(day) = self.days.iter().find(|d| !WEEKDAYS.contains(&d.as_str())) {
            return Err(AppError::Validation(format!("unknown day {:?}", day)));
        }
        if let Some(m) = self.reminder_minutes {
            if !(1..=MAX_REMINDER_MINUTES).contains(&m) {
                return Err(AppError::Validation(format!(
                    "reminder minutes must be between 1 and {}, got {}",
                    MAX_REMINDER_MINUTES, m
                )));
            }
        }
        Ok(())
    }
}

/// Parses `H:MM` / `HH:MM`, ignoring anything after the minutes (e.g. seconds).
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    let mut parts = value.trim().split(':');
    let hours = parts.next()?.trim().parse::<u32>().ok()?;
    let minutes = parts.next()?.trim().parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(hours, minutes, 0)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Form inputs submit numbers as strings.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    })
}
