use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use uuid::Uuid;

use fete_db::fmt_ts;
use fete_db::models::ReminderRow;
use fete_types::api::{Claims, CreateReminderRequest, ReminderResponse, UpdateReminderRequest};

use crate::access::{self, Action, ResourceClass};
use crate::error::ApiError;
use crate::parse_uuid;
use crate::state::AppState;

pub(crate) fn reminder_response(row: &ReminderRow) -> Result<ReminderResponse, ApiError> {
    Ok(ReminderResponse {
        id: parse_uuid(&row.id)?,
        event: parse_uuid(&row.event_id)?,
        reminder_date: row.reminder_date.clone(),
        message: row.message.clone(),
        sent: row.sent,
    })
}

pub async fn list_reminders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_reminders(&claims.sub.to_string())?;
    let rows = rows.iter().map(reminder_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

/// The write is gated on the target event's ownership chain before any row
/// is inserted: a missing event is a 404, someone else's event a 403.
pub async fn create_reminder(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateReminderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.event_owner(&req.event.to_string())?;
    access::authorize(ResourceClass::Reminder, Action::Write, owner.as_deref(), claims.sub)?;

    let id = Uuid::new_v4();
    state.db.insert_reminder(
        &id.to_string(),
        &req.event.to_string(),
        &fmt_ts(req.reminder_date),
        req.message.as_deref().unwrap_or(""),
    )?;

    let row = state
        .db
        .get_reminder(&claims.sub.to_string(), &id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("reminder vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(reminder_response(&row)?)))
}

pub async fn get_reminder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_reminder(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(reminder_response(&row)?))
}

pub async fn update_reminder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateReminderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_reminder(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let reminder_date = req.reminder_date.map(fmt_ts).unwrap_or_else(|| row.reminder_date.clone());
    let message = req.message.unwrap_or_else(|| row.message.clone());
    state
        .db
        .update_reminder(&row.id, &reminder_date, &message, req.sent.unwrap_or(false))?;

    let row = state
        .db
        .get_reminder(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(reminder_response(&row)?))
}

pub async fn delete_reminder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_reminder(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    state.db.delete_reminder(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}
