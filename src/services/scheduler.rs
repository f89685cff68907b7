use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, ClockReading};
use crate::models::ClassEntry;
use crate::notifier::{Notification, Notifier};
use crate::repository::ClassRepository;

pub const TICK_INTERVAL: Duration = Duration::from_secs(60);
pub const REMINDER_TITLE: &str = "Class Reminder 🔔";

/// Where an entry stands for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    NotToday,
    AlreadyNotified,
    InvalidStartTime,
    OutsideWindow,
    Due,
}

/// Today's `[class start - reminder minutes, class start)` for `entry`.
pub fn reminder_window(entry: &ClassEntry, now: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let class_start = now.date().and_time(entry.parsed_start_time()?);
    let lead = TimeDelta::try_minutes(entry.effective_reminder_minutes())?;
    let window_start = class_start.checked_sub_signed(lead)?;
    Some((window_start, class_start))
}

pub fn evaluate(entry: &ClassEntry, today: &str, today_date: &str, now: NaiveDateTime) -> Evaluation {
    if !entry.occurs_on(today) {
        return Evaluation::NotToday;
    }
    if !entry.is_pending(today_date) {
        return Evaluation::AlreadyNotified;
    }
    match reminder_window(entry, now) {
        None => Evaluation::InvalidStartTime,
        Some((window_start, class_start)) if window_start <= now && now < class_start => {
            Evaluation::Due
        }
        Some(_) => Evaluation::OutsideWindow,
    }
}

pub fn reminder_notification(entry: &ClassEntry) -> Notification {
    let body = match entry.venue() {
        Some(venue) => format!("{} starts at {} in {}", entry.name, entry.start_time, venue),
        None => format!("{} starts at {}", entry.name, entry.start_time),
    };
    Notification {
        title: REMINDER_TITLE.to_string(),
        body,
        tag: entry.id.clone(),
    }
}

/// Outcome of one evaluation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub skipped_no_permission: bool,
    pub fetch_failed: bool,
    pub entries_seen: usize,
    /// Entries failing the class form rules; they are still evaluated.
    pub invalid_entries: usize,
    pub notified: usize,
    pub notify_failures: usize,
    pub persisted: usize,
    pub persist_failures: usize,
}

/// Evaluates every class against the clock and dispatches due reminders.
#[derive(Clone)]
pub struct ReminderEngine {
    repository: Arc<dyn ClassRepository>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl ReminderEngine {
    pub fn new(
        repository: Arc<dyn ClassRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            notifier,
            clock,
        }
    }

    pub async fn run_tick(&self) -> TickReport {
        let mut report = TickReport::default();

        if !self.notifier.permission_granted() {
            debug!("Notification permission not granted, skipping reminder pass");
            report.skipped_no_permission = true;
            return report;
        }

        let ClockReading {
            now,
            weekday: today,
            date: today_date,
        } = self.clock.read();

        let classes = match self.repository.list_all().await {
            Ok(classes) => classes,
            Err(e) => {
                warn!("Reminder pass aborted: {}", e);
                report.fetch_failed = true;
                return report;
            }
        };
        report.entries_seen = classes.len();

        let mut persists = JoinSet::new();

        for entry in classes {
            if let Err(e) = entry.validate() {
                debug!("Class {} does not pass form rules: {}", entry.id, e);
                report.invalid_entries += 1;
            }

            match evaluate(&entry, today, &today_date, now) {
                Evaluation::Due => {}
                Evaluation::InvalidStartTime => {
                    warn!("Class {} has an unreadable start time {:?}", entry.id, entry.start_time);
                    continue;
                }
                _ => continue,
            }

            let notification = reminder_notification(&entry);
            if let Err(e) = self.notifier.show(&notification).await {
                warn!("Could not notify for {}: {}", entry.name, e);
                report.notify_failures += 1;
                continue;
            }
            report.notified += 1;

            let repository = Arc::clone(&self.repository);
            let mut updated = entry;
            updated.last_notified_date = Some(today_date.clone());
            persists.spawn(async move {
                let result = repository.update(&updated).await;
                (updated.name, result)
            });
        }

        while let Some(joined) = persists.join_next().await {
            match joined {
                Ok((name, Ok(()))) => {
                    report.persisted += 1;
                    info!("Reminder sent for {}", name);
                }
                Ok((name, Err(e))) => {
                    report.persist_failures += 1;
                    warn!("Failed to record reminder for {}: {}", name, e);
                }
                Err(e) => {
                    report.persist_failures += 1;
                    error!("Reminder persist task failed: {}", e);
                }
            }
        }

        report
    }
}

struct Running {
    handle: JoinHandle<()>,
    shutdown: oneshot::Sender<()>,
}

/// Polls the class list every minute while started.
pub struct ReminderScheduler {
    engine: ReminderEngine,
    running: Mutex<Option<Running>>,
}

impl ReminderScheduler {
    pub fn new(
        repository: Arc<dyn ClassRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine: ReminderEngine::new(repository, notifier, clock),
            running: Mutex::new(None),
        }
    }

    /// Runs a pass now and then every [`TICK_INTERVAL`]. No-op while already running.
    pub fn start(&self) {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            debug!("Reminder scheduler already running");
            return;
        }

        info!("Starting reminder scheduler (interval: {:?})", TICK_INTERVAL);

        let engine = self.engine.clone();
        let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {}
                }

                // A pass that has begun runs to completion even if stop() lands meanwhile.
                let report = engine.run_tick().await;
                if report.notified > 0 || report.persist_failures > 0 {
                    info!(
                        "Reminder pass - notified: {}, recorded: {}, record failures: {}",
                        report.notified, report.persisted, report.persist_failures
                    );
                } else {
                    debug!("Reminder pass: {:?}", report);
                }
            }

            info!("Reminder scheduler stopped");
        });

        *running = Some(Running { handle, shutdown });
    }

    /// Stops scheduling further passes. Safe to call when not running.
    pub fn stop(&self) {
        let running = self.running.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(running) = running {
            // the loop may already be gone
            let _ = running.shutdown.send(());
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    pub async fn run_tick(&self) -> TickReport {
        self.engine.run_tick().await
    }
}
