use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use class_reminder::clock::ManualClock;
use class_reminder::models::ClassEntry;
use class_reminder::notifier::{Notifier, RecordingNotifier};
use class_reminder::repository::InMemoryClassRepository;
use class_reminder::services::ReminderScheduler;

const MONDAY: &str = "2026-10-12";

fn monday_at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 12)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn algorithms() -> ClassEntry {
    let mut entry = ClassEntry::new("c1", "Algorithms", &["Monday", "Tuesday"], "09:00");
    entry.reminder_minutes = Some(10);
    entry.venue = Some("Room 101".to_string());
    entry
}

struct Harness {
    repository: Arc<InMemoryClassRepository>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<ManualClock>,
    scheduler: ReminderScheduler,
}

fn harness(entries: Vec<ClassEntry>, now: NaiveDateTime) -> Harness {
    let repository = Arc::new(InMemoryClassRepository::new(entries));
    let notifier = Arc::new(RecordingNotifier::new(true));
    let clock = Arc::new(ManualClock::new(now));
    let scheduler = ReminderScheduler::new(repository.clone(), notifier.clone(), clock.clone());
    Harness {
        repository,
        notifier,
        clock,
        scheduler,
    }
}

/// Lets spawned work settle without reaching the next minute.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

async fn next_minute(h: &Harness) {
    h.clock.advance(chrono::Duration::minutes(1));
    tokio::time::sleep(Duration::from_secs(60)).await;
}

#[tokio::test]
async fn test_dispatches_once_when_window_opens() {
    let h = harness(vec![algorithms()], monday_at(8, 50, 0));

    let report = h.scheduler.run_tick().await;
    assert_eq!(report.entries_seen, 1);
    assert_eq!(report.notified, 1);
    assert_eq!(report.persisted, 1);

    let shown = h.notifier.shown();
    assert_eq!(shown[0].title, "Class Reminder 🔔");
    assert_eq!(shown[0].body, "Algorithms starts at 09:00 in Room 101");
    assert_eq!(shown[0].tag, "c1");
    assert_eq!(
        h.repository.get("c1").unwrap().last_notified_date.as_deref(),
        Some(MONDAY)
    );

    h.clock.set(monday_at(8, 55, 0));
    let report = h.scheduler.run_tick().await;
    assert_eq!(report.notified, 0);
    assert_eq!(h.notifier.shown_count(), 1);
}

#[tokio::test]
async fn test_window_bounds() {
    let h = harness(vec![algorithms()], monday_at(8, 49, 59));
    assert_eq!(h.scheduler.run_tick().await.notified, 0);

    h.clock.set(monday_at(9, 0, 0));
    assert_eq!(h.scheduler.run_tick().await.notified, 0);

    // a missed window is not caught up later in the day
    h.clock.set(monday_at(11, 0, 0));
    assert_eq!(h.scheduler.run_tick().await.notified, 0);
    assert_eq!(h.notifier.shown_count(), 0);
    assert_eq!(h.repository.update_calls(), 0);
}

#[tokio::test]
async fn test_other_days_never_fire() {
    let mut wednesday_only = algorithms();
    wednesday_only.days = vec!["Wednesday".to_string()];
    let mut no_days = algorithms();
    no_days.id = "c2".to_string();
    no_days.days.clear();

    let h = harness(vec![wednesday_only, no_days], monday_at(8, 55, 0));
    let report = h.scheduler.run_tick().await;
    assert_eq!(report.entries_seen, 2);
    assert_eq!(report.notified, 0);
}

#[tokio::test]
async fn test_already_notified_today_is_skipped() {
    let mut entry = algorithms();
    entry.last_notified_date = Some(MONDAY.to_string());
    let h = harness(vec![entry], monday_at(8, 55, 0));

    assert_eq!(h.scheduler.run_tick().await.notified, 0);
    assert_eq!(h.repository.list_calls(), 1);
}

#[tokio::test]
async fn test_new_day_resets_pending_state() {
    let h = harness(vec![algorithms()], monday_at(8, 55, 0));
    assert_eq!(h.scheduler.run_tick().await.notified, 1);

    h.clock.advance(chrono::Duration::days(1));
    assert_eq!(h.scheduler.run_tick().await.notified, 1);
    assert_eq!(
        h.repository.get("c1").unwrap().last_notified_date.as_deref(),
        Some("2026-10-13")
    );
}

#[tokio::test]
async fn test_permission_denied_skips_fetch() {
    let h = harness(vec![algorithms()], monday_at(8, 55, 0));
    h.notifier.set_permission_granted(false);

    let report = h.scheduler.run_tick().await;
    assert!(report.skipped_no_permission);
    assert_eq!(h.repository.list_calls(), 0);
    assert_eq!(h.notifier.shown_count(), 0);
}

#[tokio::test]
async fn test_fetch_failure_aborts_only_the_tick() {
    let h = harness(vec![algorithms()], monday_at(8, 55, 0));
    h.repository.set_fail_list(true);

    let report = h.scheduler.run_tick().await;
    assert!(report.fetch_failed);
    assert_eq!(h.notifier.shown_count(), 0);

    h.repository.set_fail_list(false);
    assert_eq!(h.scheduler.run_tick().await.notified, 1);
}

#[tokio::test]
async fn test_persist_failure_is_isolated_and_retried() {
    let mut databases = ClassEntry::new("c2", "Databases", &["Monday"], "09:05");
    databases.reminder_minutes = Some(30);
    let h = harness(vec![algorithms(), databases], monday_at(8, 55, 0));
    h.repository.set_fail_updates(true);

    let report = h.scheduler.run_tick().await;
    assert_eq!(report.notified, 2);
    assert_eq!(report.persist_failures, 2);
    assert_eq!(report.persisted, 0);

    // nothing was recorded, so the next pass notifies again
    h.repository.set_fail_updates(false);
    h.clock.set(monday_at(8, 56, 0));
    let report = h.scheduler.run_tick().await;
    assert_eq!(report.notified, 2);
    assert_eq!(report.persisted, 2);
    assert_eq!(h.notifier.shown_count(), 4);
}

#[tokio::test]
async fn test_entries_failing_form_rules_are_flagged_but_evaluated() {
    let mut long_lead = algorithms();
    long_lead.reminder_minutes = Some(500);
    let mut odd_day = ClassEntry::new("c2", "Databases", &["Monday", "Funday"], "09:05");
    odd_day.reminder_minutes = Some(30);
    let valid = ClassEntry::new("c3", "Statistics", &["Friday"], "08:00");

    let h = harness(vec![long_lead, odd_day, valid], monday_at(8, 55, 0));
    let report = h.scheduler.run_tick().await;
    assert_eq!(report.entries_seen, 3);
    assert_eq!(report.invalid_entries, 2);
    assert_eq!(report.notified, 2);
}

#[tokio::test]
async fn test_notify_failure_records_nothing() {
    let h = harness(vec![algorithms()], monday_at(8, 55, 0));
    h.notifier.set_failing(true);

    let report = h.scheduler.run_tick().await;
    assert_eq!(report.notify_failures, 1);
    assert_eq!(report.notified, 0);
    assert_eq!(h.repository.update_calls(), 0);
    assert!(h.repository.get("c1").unwrap().is_pending(MONDAY));
}

#[tokio::test(start_paused = true)]
async fn test_start_runs_immediately_then_every_minute() {
    let h = harness(vec![algorithms()], monday_at(8, 40, 0));

    h.scheduler.start();
    settle().await;
    assert!(h.scheduler.is_running());
    assert_eq!(h.repository.list_calls(), 1);
    assert_eq!(h.notifier.shown_count(), 0);

    // 08:41 .. 08:50: the tenth minute opens the window
    for _ in 0..10 {
        next_minute(&h).await;
    }
    assert_eq!(h.repository.list_calls(), 11);
    assert_eq!(h.notifier.shown_count(), 1);

    next_minute(&h).await;
    assert_eq!(h.repository.list_calls(), 12);
    assert_eq!(h.notifier.shown_count(), 1);

    h.scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_keeps_a_single_timer() {
    let h = harness(vec![algorithms()], monday_at(8, 0, 0));

    h.scheduler.start();
    h.scheduler.start();
    settle().await;
    assert_eq!(h.repository.list_calls(), 1);

    next_minute(&h).await;
    next_minute(&h).await;
    assert_eq!(h.repository.list_calls(), 3);

    h.scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_further_passes() {
    let h = harness(vec![algorithms()], monday_at(8, 45, 0));

    h.scheduler.start();
    settle().await;
    h.scheduler.stop();
    assert!(!h.scheduler.is_running());

    for _ in 0..10 {
        next_minute(&h).await;
    }
    assert_eq!(h.repository.list_calls(), 1);
    assert_eq!(h.notifier.shown_count(), 0);

    // stop is idempotent and the scheduler can be started again
    h.scheduler.stop();
    h.scheduler.start();
    settle().await;
    assert_eq!(h.notifier.shown_count(), 1);
    h.scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn test_timer_survives_fetch_failures() {
    let h = harness(vec![algorithms()], monday_at(8, 55, 0));
    h.repository.set_fail_list(true);

    h.scheduler.start();
    settle().await;
    next_minute(&h).await;
    assert_eq!(h.repository.list_calls(), 2);
    assert_eq!(h.notifier.shown_count(), 0);

    h.repository.set_fail_list(false);
    next_minute(&h).await;
    assert!(h.scheduler.is_running());
    assert_eq!(h.notifier.shown_count(), 1);

    h.scheduler.stop();
}
