use axum::Json;
use axum::extract::Query;
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::notifier;
use crate::services::schedule::{self, DaySchedule, TodaySummary};
use crate::services::TickReport;
use crate::state::AppState;

#[derive(Deserialize)]
struct TimetableParams {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    day: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReminderStatus {
    pub running: bool,
    pub permission_granted: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/reminders/status", get(reminder_status))
        .route("/reminders/start", post(start_reminders))
        .route("/reminders/stop", post(stop_reminders))
        .route("/reminders/tick", post(tick_now))
        .route(
            "/notifications/permission",
            post(grant_permission).delete(revoke_permission),
        )
        .route("/classes/today", get(today))
        .route("/timetable", get(timetable))
        .with_state(state)
}

fn status(state: &AppState) -> ReminderStatus {
    ReminderStatus {
        running: state.scheduler.is_running(),
        permission_granted: state.notifier.permission_granted(),
    }
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn reminder_status(State(state): State<AppState>) -> Json<ReminderStatus> {
    Json(status(&state))
}

async fn start_reminders(State(state): State<AppState>) -> Json<ReminderStatus> {
    state.scheduler.start();
    Json(status(&state))
}

async fn stop_reminders(State(state): State<AppState>) -> Json<ReminderStatus> {
    state.scheduler.stop();
    Json(status(&state))
}

async fn tick_now(State(state): State<AppState>) -> Json<TickReport> {
    Json(state.scheduler.run_tick().await)
}

async fn grant_permission(State(state): State<AppState>) -> Json<ReminderStatus> {
    if notifier::request_permission(state.notifier.as_ref()).await {
        state.scheduler.start();
    }
    Json(status(&state))
}

async fn revoke_permission(State(state): State<AppState>) -> Json<ReminderStatus> {
    state.notifier.set_permission_granted(false);
    info!("Notification permission revoked");
    Json(status(&state))
}

async fn today(State(state): State<AppState>) -> Result<Json<TodaySummary>, AppError> {
    let classes = state.repository.list_all().await?;
    Ok(Json(schedule::today_summary(&classes, state.clock.now())))
}

async fn timetable(
    State(state): State<AppState>,
    Query(params): Query<TimetableParams>,
) -> Result<Json<Vec<DaySchedule>>, AppError> {
    let classes = state.repository.list_all().await?;
    let classes =
        schedule::filter_classes(&classes, params.search.as_deref(), params.day.as_deref());
    Ok(Json(schedule::weekly_timetable(&classes)))
}
