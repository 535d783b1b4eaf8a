use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use uuid::Uuid;

use fete_db::fmt_ts;
use fete_db::models::EventRow;
use fete_db::queries::events::{EventFilter, EventOrdering, EventUpdate, NewEvent};
use fete_types::api::{
    Claims, CreateEventRequest, EventDetail, EventSummary, EventTypeResponse, UpdateEventRequest,
};

use crate::error::ApiError;
use crate::parse_uuid;
use crate::state::AppState;
use crate::{gifts, guests, planning, reminders};

pub async fn list_event_types(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let types = state.db.list_event_types()?;
    let types = types
        .iter()
        .map(|t| {
            Ok(EventTypeResponse {
                id: parse_uuid(&t.id)?,
                name: t.name.clone(),
                icon: t.icon.clone(),
                color: t.color.clone(),
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;
    Ok(Json(types))
}

#[derive(Debug, Deserialize)]
pub struct EventListQuery {
    pub event_type: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub is_private: Option<bool>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = EventFilter {
        event_type: query.event_type.map(|id| id.to_string()),
        start_date: query.start_date.map(fmt_ts),
        is_private: query.is_private,
        search: query.search,
        // Unknown ordering values fall back to the default, start_date DESC
        ordering: query.ordering.as_deref().and_then(EventOrdering::parse),
    };

    let rows = state.db.list_events(&claims.sub.to_string(), &filter)?;
    Ok(Json(summaries(&state, rows)?))
}

pub async fn create_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title", "title must not be empty"));
    }
    if !state.db.event_type_exists(&req.event_type.to_string())? {
        return Err(ApiError::validation("event_type", "unknown event type"));
    }
    if let Some(end) = req.end_date
        && end < req.start_date
    {
        return Err(ApiError::validation("end_date", "end date precedes start date"));
    }

    let id = Uuid::new_v4();
    state.db.insert_event(&NewEvent {
        id: &id.to_string(),
        title: &req.title,
        event_type_id: &req.event_type.to_string(),
        description: req.description.as_deref().unwrap_or(""),
        location: req.location.as_deref().unwrap_or(""),
        start_date: &fmt_ts(req.start_date),
        end_date: req.end_date.map(fmt_ts).as_deref(),
        created_by: &claims.sub.to_string(),
        now: &state.now(),
        is_private: req.is_private.unwrap_or(false),
    })?;

    let row = state
        .db
        .get_event(&claims.sub.to_string(), &id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("event vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(event_summary(&state, &row)?)))
}

/// Detail view: the summary plus nested guest, task and gift-list shapes.
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_event(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let guests = state
        .db
        .list_guests_for_event(&row.id)?
        .iter()
        .map(guests::guest_response)
        .collect::<Result<Vec<_>, _>>()?;
    let tasks = state
        .db
        .list_tasks_for_event(&row.id)?
        .iter()
        .map(planning::task_response)
        .collect::<Result<Vec<_>, _>>()?;
    let gift_list = state
        .db
        .gift_list_for_event(&row.id)?
        .map(|l| gifts::gift_list_response(&l))
        .transpose()?;

    Ok(Json(EventDetail {
        summary: event_summary(&state, &row)?,
        guests,
        tasks,
        gift_list,
    }))
}

pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_event(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let event_type_id = match req.event_type {
        Some(event_type) => {
            if !state.db.event_type_exists(&event_type.to_string())? {
                return Err(ApiError::validation("event_type", "unknown event type"));
            }
            event_type.to_string()
        }
        None => row.event_type_id.clone(),
    };

    let start_date = req.start_date.map(fmt_ts).unwrap_or_else(|| row.start_date.clone());
    // Double-Option: absent keeps the stored end date, explicit null clears it
    let end_date = match req.end_date {
        Some(end) => end.map(fmt_ts),
        None => row.end_date.clone(),
    };
    let updated_at = state.now();
    let update = EventUpdate {
        title: req.title.as_deref().unwrap_or(&row.title),
        event_type_id: &event_type_id,
        description: req.description.as_deref().unwrap_or(&row.description),
        location: req.location.as_deref().unwrap_or(&row.location),
        start_date: &start_date,
        end_date: end_date.as_deref(),
        is_private: req.is_private.unwrap_or(row.is_private),
        updated_at: &updated_at,
    };
    state.db.update_event(&row.id, &update)?;

    let row = state
        .db
        .get_event(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(event_summary(&state, &row)?))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    // Authorize before the cascade: a foreign event reads as missing
    let row = state
        .db
        .get_event(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;

    state.db.delete_event(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn upcoming(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let now = state.now();
    let rows = state.db.upcoming_events(&claims.sub.to_string(), &now)?;
    Ok(Json(summaries(&state, rows)?))
}

#[derive(Debug, Deserialize)]
pub struct ByMonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub async fn by_month(
    State(state): State<AppState>,
    Query(query): Query<ByMonthQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let today = state.clock.now();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());
    if !(1..=12).contains(&month) {
        return Err(ApiError::validation("month", "month must be between 1 and 12"));
    }

    let rows = state.db.events_by_month(&claims.sub.to_string(), year, month)?;
    Ok(Json(summaries(&state, rows)?))
}

pub(crate) fn event_summary(state: &AppState, row: &EventRow) -> Result<EventSummary, ApiError> {
    let event_reminders = state
        .db
        .list_reminders_for_event(&row.id)?
        .iter()
        .map(reminders::reminder_response)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EventSummary {
        id: parse_uuid(&row.id)?,
        title: row.title.clone(),
        event_type: parse_uuid(&row.event_type_id)?,
        event_type_name: row.event_type_name.clone(),
        event_type_color: row.event_type_color.clone(),
        description: row.description.clone(),
        location: row.location.clone(),
        start_date: row.start_date.clone(),
        end_date: row.end_date.clone(),
        created_by: parse_uuid(&row.created_by)?,
        created_at: row.created_at.clone(),
        updated_at: row.updated_at.clone(),
        is_private: row.is_private,
        reminders: event_reminders,
    })
}

fn summaries(state: &AppState, rows: Vec<EventRow>) -> Result<Vec<EventSummary>, ApiError> {
    rows.iter().map(|row| event_summary(state, row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_state;

    fn claims(sub: Uuid) -> Claims {
        Claims {
            sub,
            email: format!("{}@example.com", sub),
            exp: 0,
        }
    }

    fn mk_user(state: &AppState, id: Uuid) {
        state
            .db
            .create_user(
                &id.to_string(),
                "user",
                &format!("{}@example.com", id),
                "hash",
                "",
                "",
                &state.now(),
            )
            .unwrap();
    }

    fn mk_event(state: &AppState, owner: Uuid, start: &str) -> Uuid {
        let type_id = state.db.list_event_types().unwrap()[0].id.clone();
        let id = Uuid::new_v4();
        state
            .db
            .insert_event(&NewEvent {
                id: &id.to_string(),
                title: "fête",
                event_type_id: &type_id,
                description: "",
                location: "",
                start_date: start,
                end_date: None,
                created_by: &owner.to_string(),
                now: &state.now(),
                is_private: false,
            })
            .unwrap();
        id
    }

    #[tokio::test]
    async fn foreign_event_reads_as_not_found() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        let stranger = Uuid::from_u128(2);
        mk_user(&state, owner);
        mk_user(&state, stranger);
        let event_id = mk_event(&state, owner, "2024-06-10 00:00:00");

        let Err(err) = get_event(State(state.clone()), Path(event_id), Extension(claims(stranger))).await
        else {
            panic!("expected not found");
        };
        assert!(matches!(err, ApiError::NotFound));

        // Same outcome for delete: no existence leak, and the row survives
        let Err(err) =
            delete_event(State(state.clone()), Path(event_id), Extension(claims(stranger))).await
        else {
            panic!("expected not found");
        };
        assert!(matches!(err, ApiError::NotFound));
        assert!(
            state
                .db
                .get_event(&owner.to_string(), &event_id.to_string())
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn by_month_defaults_to_the_clock_month() {
        let state = test_state(); // pinned to 2024-06-01
        let owner = Uuid::from_u128(1);
        mk_user(&state, owner);
        mk_event(&state, owner, "2024-06-15 00:00:00");
        mk_event(&state, owner, "2024-07-15 00:00:00");

        // No explicit year/month: only the June event is in range
        let query = ByMonthQuery { year: None, month: None };
        assert!(
            by_month(State(state.clone()), Query(query), Extension(claims(owner)))
                .await
                .is_ok()
        );
        let rows = state.db.events_by_month(&owner.to_string(), 2024, 6).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn month_out_of_range_is_a_field_error() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        mk_user(&state, owner);

        let query = ByMonthQuery { year: Some(2024), month: Some(13) };
        let Err(err) = by_month(State(state), Query(query), Extension(claims(owner))).await else {
            panic!("expected validation error");
        };
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn patch_can_clear_the_end_date() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        mk_user(&state, owner);

        let type_id = state.db.list_event_types().unwrap()[0].id.clone();
        let event_id = Uuid::new_v4();
        state
            .db
            .insert_event(&NewEvent {
                id: &event_id.to_string(),
                title: "fête",
                event_type_id: &type_id,
                description: "",
                location: "",
                start_date: "2024-06-10 00:00:00",
                end_date: Some("2024-06-12 00:00:00"),
                created_by: &owner.to_string(),
                now: &state.now(),
                is_private: false,
            })
            .unwrap();

        // Omitting end_date leaves the stored value untouched
        let req = UpdateEventRequest {
            title: None,
            event_type: None,
            description: None,
            location: None,
            start_date: None,
            end_date: None,
            is_private: None,
        };
        assert!(
            update_event(
                State(state.clone()),
                Path(event_id),
                Extension(claims(owner)),
                Json(req),
            )
            .await
            .is_ok()
        );
        let row = state
            .db
            .get_event(&owner.to_string(), &event_id.to_string())
            .unwrap()
            .unwrap();
        assert_eq!(row.end_date.as_deref(), Some("2024-06-12 00:00:00"));

        // An explicit null clears it
        let req = UpdateEventRequest {
            title: None,
            event_type: None,
            description: None,
            location: None,
            start_date: None,
            end_date: Some(None),
            is_private: None,
        };
        assert!(
            update_event(
                State(state.clone()),
                Path(event_id),
                Extension(claims(owner)),
                Json(req),
            )
            .await
            .is_ok()
        );
        let row = state
            .db
            .get_event(&owner.to_string(), &event_id.to_string())
            .unwrap()
            .unwrap();
        assert_eq!(row.end_date, None);
    }

    #[tokio::test]
    async fn create_rejects_unknown_event_type() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        mk_user(&state, owner);

        let req = CreateEventRequest {
            title: "fête".into(),
            event_type: Uuid::from_u128(999),
            description: None,
            location: None,
            start_date: state.clock.now(),
            end_date: None,
            is_private: None,
        };
        let Err(err) = create_event(State(state), Extension(claims(owner)), Json(req)).await else {
            panic!("expected validation error");
        };
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
