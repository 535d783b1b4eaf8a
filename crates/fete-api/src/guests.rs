use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use rand::distr::{Alphanumeric, SampleString};
use uuid::Uuid;

use fete_db::models::{GuestGroupRow, GuestRow, InvitationRow};
use fete_db::queries::guests::{GuestUpdate, NewGuest};
use fete_types::api::{
    Claims, CreateGuestGroupRequest, CreateGuestRequest, CreateInvitationRequest,
    GuestGroupResponse, GuestResponse, InvitationResponse, UpdateGuestRequest,
};
use fete_types::models::ResponseStatus;

use crate::access::{self, Action, ResourceClass};
use crate::error::ApiError;
use crate::parse_uuid;
use crate::state::AppState;

fn group_response(row: &GuestGroupRow) -> Result<GuestGroupResponse, ApiError> {
    Ok(GuestGroupResponse {
        id: parse_uuid(&row.id)?,
        event: parse_uuid(&row.event_id)?,
        name: row.name.clone(),
    })
}

pub(crate) fn guest_response(row: &GuestRow) -> Result<GuestResponse, ApiError> {
    Ok(GuestResponse {
        id: parse_uuid(&row.id)?,
        event: parse_uuid(&row.event_id)?,
        group: row.group_id.as_deref().map(parse_uuid).transpose()?,
        user: row.user_id.as_deref().map(parse_uuid).transpose()?,
        name: row.name.clone(),
        email: row.email.clone(),
        phone: row.phone.clone(),
        response_status: row.response_status,
        plus_ones: row.plus_ones,
        note: row.note.clone(),
        invited_at: row.invited_at.clone(),
        responded_at: row.responded_at.clone(),
    })
}

fn invitation_response(row: &InvitationRow) -> Result<InvitationResponse, ApiError> {
    Ok(InvitationResponse {
        id: parse_uuid(&row.id)?,
        guest: parse_uuid(&row.guest_id)?,
        message: row.message.clone(),
        sent_at: row.sent_at.clone(),
        viewed_at: row.viewed_at.clone(),
        unique_code: row.unique_code.clone(),
    })
}

// -- Guest groups --

pub async fn list_guest_groups(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_guest_groups(&claims.sub.to_string())?;
    let rows = rows.iter().map(group_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

pub async fn create_guest_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGuestGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.event_owner(&req.event.to_string())?;
    access::authorize(ResourceClass::Guest, Action::Write, owner.as_deref(), claims.sub)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("name", "name must not be empty"));
    }

    let id = Uuid::new_v4();
    state
        .db
        .insert_guest_group(&id.to_string(), &req.event.to_string(), &req.name)?;

    let row = state
        .db
        .get_guest_group(&claims.sub.to_string(), &id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("guest group vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(group_response(&row)?)))
}

pub async fn delete_guest_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_guest_group(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    state.db.delete_guest_group(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Guests --

pub async fn list_guests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_guests(&claims.sub.to_string())?;
    let rows = rows.iter().map(guest_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

pub async fn create_guest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGuestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.event_owner(&req.event.to_string())?;
    access::authorize(ResourceClass::Guest, Action::Write, owner.as_deref(), claims.sub)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("name", "name must not be empty"));
    }

    // A group reference must belong to the same event
    let group_id = match req.group {
        Some(group) => {
            let group_row = state
                .db
                .get_guest_group(&claims.sub.to_string(), &group.to_string())?
                .ok_or(ApiError::NotFound)?;
            if group_row.event_id != req.event.to_string() {
                return Err(ApiError::validation("group", "group belongs to another event"));
            }
            Some(group_row.id)
        }
        None => None,
    };

    let id = Uuid::new_v4();
    state.db.insert_guest(&NewGuest {
        id: &id.to_string(),
        event_id: &req.event.to_string(),
        group_id: group_id.as_deref(),
        user_id: req.user.map(|u| u.to_string()).as_deref(),
        name: &req.name,
        email: req.email.as_deref().unwrap_or(""),
        phone: req.phone.as_deref().unwrap_or(""),
        plus_ones: req.plus_ones.unwrap_or(0),
        note: req.note.as_deref().unwrap_or(""),
        invited_at: &state.now(),
    })?;

    let row = state
        .db
        .get_guest(&claims.sub.to_string(), &id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("guest vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(guest_response(&row)?)))
}

pub async fn get_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_guest(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(guest_response(&row)?))
}

/// RSVP tracking: moving off `pending` stamps `responded_at` with the
/// current time, once.
pub async fn update_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateGuestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_guest(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let group_id = match req.group {
        Some(group) => {
            let group_row = state
                .db
                .get_guest_group(&claims.sub.to_string(), &group.to_string())?
                .ok_or(ApiError::NotFound)?;
            if group_row.event_id != row.event_id {
                return Err(ApiError::validation("group", "group belongs to another event"));
            }
            Some(group_row.id)
        }
        None => row.group_id.clone(),
    };

    let response_status = req.response_status.unwrap_or(row.response_status);
    let responded_at = match (&row.responded_at, response_status) {
        (Some(at), _) => Some(at.clone()),
        (None, ResponseStatus::Pending) => None,
        (None, _) => Some(state.now()),
    };

    let update = GuestUpdate {
        group_id: group_id.as_deref(),
        name: req.name.as_deref().unwrap_or(&row.name),
        email: req.email.as_deref().unwrap_or(&row.email),
        phone: req.phone.as_deref().unwrap_or(&row.phone),
        response_status,
        plus_ones: req.plus_ones.unwrap_or(row.plus_ones),
        note: req.note.as_deref().unwrap_or(&row.note),
        responded_at: responded_at.as_deref(),
    };
    state.db.update_guest(&row.id, &update)?;

    let row = state
        .db
        .get_guest(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(guest_response(&row)?))
}

pub async fn delete_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_guest(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    state.db.delete_guest(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Invitations --

pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_invitations(&claims.sub.to_string())?;
    let rows = rows.iter().map(invitation_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateInvitationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.guest_owner(&req.guest.to_string())?;
    access::authorize(ResourceClass::Guest, Action::Write, owner.as_deref(), claims.sub)?;

    let id = Uuid::new_v4();
    let unique_code = Alphanumeric.sample_string(&mut rand::rng(), 32);
    let sent_at = state.now();
    state.db.insert_invitation(
        &id.to_string(),
        &req.guest.to_string(),
        req.message.as_deref().unwrap_or(""),
        &sent_at,
        &unique_code,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(InvitationResponse {
            id,
            guest: req.guest,
            message: req.message.unwrap_or_default(),
            sent_at,
            viewed_at: None,
            unique_code,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_state;
    use fete_db::queries::events::NewEvent;

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

    fn mk_event(state: &AppState, owner: Uuid) -> Uuid {
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
                start_date: "2024-06-10 00:00:00",
                end_date: None,
                created_by: &owner.to_string(),
                now: &state.now(),
                is_private: false,
            })
            .unwrap();
        id
    }

    async fn mk_guest(state: &AppState, owner: Uuid, event: Uuid) -> Uuid {
        let req = CreateGuestRequest {
            event,
            group: None,
            user: None,
            name: "Claire".into(),
            email: None,
            phone: None,
            plus_ones: None,
            note: None,
        };
        assert!(
            create_guest(State(state.clone()), Extension(claims(owner)), Json(req))
                .await
                .is_ok()
        );
        let rows = state.db.list_guests(&owner.to_string()).unwrap();
        rows.last().unwrap().id.parse().unwrap()
    }

    #[tokio::test]
    async fn responding_stamps_responded_at_once() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        mk_user(&state, owner);
        let event = mk_event(&state, owner);
        let guest = mk_guest(&state, owner, event).await;

        let req = UpdateGuestRequest {
            group: None,
            name: None,
            email: None,
            phone: None,
            response_status: Some(ResponseStatus::Accepted),
            plus_ones: None,
            note: None,
        };
        assert!(
            update_guest(State(state.clone()), Path(guest), Extension(claims(owner)), Json(req))
                .await
                .is_ok()
        );
        let row = state.db.get_guest(&owner.to_string(), &guest.to_string()).unwrap().unwrap();
        let first_response = row.responded_at.clone().expect("responded_at set");

        // A later status change keeps the original timestamp
        let req = UpdateGuestRequest {
            group: None,
            name: None,
            email: None,
            phone: None,
            response_status: Some(ResponseStatus::Declined),
            plus_ones: None,
            note: None,
        };
        assert!(
            update_guest(State(state.clone()), Path(guest), Extension(claims(owner)), Json(req))
                .await
                .is_ok()
        );
        let row = state.db.get_guest(&owner.to_string(), &guest.to_string()).unwrap().unwrap();
        assert_eq!(row.responded_at.as_deref(), Some(first_response.as_str()));
    }

    #[tokio::test]
    async fn guest_cannot_join_a_group_of_another_event() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        mk_user(&state, owner);
        let event_a = mk_event(&state, owner);
        let event_b = mk_event(&state, owner);
        let guest = mk_guest(&state, owner, event_a).await;

        let group = Uuid::new_v4();
        state
            .db
            .insert_guest_group(&group.to_string(), &event_b.to_string(), "famille")
            .unwrap();

        let req = UpdateGuestRequest {
            group: Some(group),
            name: None,
            email: None,
            phone: None,
            response_status: None,
            plus_ones: None,
            note: None,
        };
        let Err(err) =
            update_guest(State(state), Path(guest), Extension(claims(owner)), Json(req)).await
        else {
            panic!("expected validation error");
        };
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn invitation_for_foreign_guest_is_denied() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        let stranger = Uuid::from_u128(2);
        mk_user(&state, owner);
        mk_user(&state, stranger);
        let event = mk_event(&state, owner);
        let guest = mk_guest(&state, owner, event).await;

        let req = CreateInvitationRequest { guest, message: None };
        let Err(err) =
            create_invitation(State(state.clone()), Extension(claims(stranger)), Json(req)).await
        else {
            panic!("expected access denied");
        };
        assert!(matches!(err, ApiError::AccessDenied));
        assert!(state.db.list_invitations(&owner.to_string()).unwrap().is_empty());
    }
}
