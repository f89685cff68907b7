pub mod schedule;
pub mod scheduler;

pub use schedule::{DaySchedule, NextClass, TodaySummary};
pub use scheduler::{ReminderEngine, ReminderScheduler, TickReport};
