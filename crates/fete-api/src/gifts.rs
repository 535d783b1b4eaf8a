use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use uuid::Uuid;

use fete_db::models::{GiftListRow, GiftRow};
use fete_db::queries::gifts::{GiftUpdate, NewGift};
use fete_types::api::{
    Claims, CreateGiftListRequest, CreateGiftRequest, GiftListResponse, GiftResponse,
    UpdateGiftRequest,
};

use crate::access::{self, Action, ResourceClass};
use crate::error::ApiError;
use crate::parse_uuid;
use crate::state::AppState;

pub(crate) fn gift_list_response(row: &GiftListRow) -> Result<GiftListResponse, ApiError> {
    Ok(GiftListResponse {
        id: parse_uuid(&row.id)?,
        event: parse_uuid(&row.event_id)?,
        name: row.name.clone(),
        description: row.description.clone(),
        created_at: row.created_at.clone(),
    })
}

fn gift_response(row: &GiftRow) -> Result<GiftResponse, ApiError> {
    Ok(GiftResponse {
        id: parse_uuid(&row.id)?,
        list: parse_uuid(&row.list_id)?,
        name: row.name.clone(),
        description: row.description.clone(),
        price: row.price,
        url: row.url.clone(),
        image: row.image.clone(),
        status: row.status,
        reserved_by: row.reserved_by.as_deref().map(parse_uuid).transpose()?,
        created_at: row.created_at.clone(),
    })
}

// -- Gift lists --

pub async fn list_gift_lists(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_gift_lists(&claims.sub.to_string())?;
    let rows = rows.iter().map(gift_list_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

pub async fn create_gift_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGiftListRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.event_owner(&req.event.to_string())?;
    access::authorize(ResourceClass::Gift, Action::Write, owner.as_deref(), claims.sub)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("name", "name must not be empty"));
    }
    // One list per event
    if state.db.gift_list_for_event(&req.event.to_string())?.is_some() {
        return Err(ApiError::validation("event", "event already has a gift list"));
    }

    let id = Uuid::new_v4();
    state.db.insert_gift_list(
        &id.to_string(),
        &req.event.to_string(),
        &req.name,
        req.description.as_deref().unwrap_or(""),
        &state.now(),
    )?;

    let row = state
        .db
        .get_gift_list(&claims.sub.to_string(), &id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("gift list vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(gift_list_response(&row)?)))
}

pub async fn get_gift_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_gift_list(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(gift_list_response(&row)?))
}

pub async fn delete_gift_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_gift_list(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    state.db.delete_gift_list(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Gifts --

pub async fn list_gifts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_gifts(&claims.sub.to_string())?;
    let rows = rows.iter().map(gift_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

pub async fn create_gift(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGiftRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.gift_list_owner(&req.list.to_string())?;
    access::authorize(ResourceClass::Gift, Action::Write, owner.as_deref(), claims.sub)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("name", "name must not be empty"));
    }

    let id = Uuid::new_v4();
    state.db.insert_gift(&NewGift {
        id: &id.to_string(),
        list_id: &req.list.to_string(),
        name: &req.name,
        description: req.description.as_deref().unwrap_or(""),
        price: req.price,
        url: req.url.as_deref().unwrap_or(""),
        image: req.image.as_deref(),
        created_at: &state.now(),
    })?;

    let row = state
        .db
        .get_gift(&claims.sub.to_string(), &id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("gift vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(gift_response(&row)?)))
}

pub async fn get_gift(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_gift(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(gift_response(&row)?))
}

/// Reservation bookkeeping: `reserved_by` is set exactly when the status
/// requires a reserver, defaulting to the caller, and cleared when the gift
/// goes back to available.
pub async fn update_gift(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateGiftRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_gift(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let status = req.status.unwrap_or(row.status);
    let reserved_by = if status.requires_reserver() {
        Some(
            req.reserved_by
                .map(|u| u.to_string())
                .or_else(|| row.reserved_by.clone())
                .unwrap_or_else(|| claims.sub.to_string()),
        )
    } else {
        None
    };

    let image = req.image.or_else(|| row.image.clone());
    let update = GiftUpdate {
        name: req.name.as_deref().unwrap_or(&row.name),
        description: req.description.as_deref().unwrap_or(&row.description),
        price: req.price.or(row.price),
        url: req.url.as_deref().unwrap_or(&row.url),
        image: image.as_deref(),
        status,
        reserved_by: reserved_by.as_deref(),
    };
    state.db.update_gift(&row.id, &update)?;

    let row = state
        .db
        .get_gift(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(gift_response(&row)?))
}

pub async fn delete_gift(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_gift(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    state.db.delete_gift(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_state;
    use fete_db::queries::events::NewEvent;
    use fete_types::models::GiftStatus;

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

    async fn mk_list(state: &AppState, owner: Uuid, event: Uuid) -> Uuid {
        let req = CreateGiftListRequest {
            event,
            name: "liste de mariage".into(),
            description: None,
        };
        assert!(
            create_gift_list(State(state.clone()), Extension(claims(owner)), Json(req))
                .await
                .is_ok()
        );
        state.db.gift_list_for_event(&event.to_string()).unwrap().unwrap().id.parse().unwrap()
    }

    async fn mk_gift(state: &AppState, owner: Uuid, list: Uuid) -> Uuid {
        let req = CreateGiftRequest {
            list,
            name: "vase".into(),
            description: None,
            price: Some(30.0),
            url: None,
            image: None,
        };
        assert!(
            create_gift(State(state.clone()), Extension(claims(owner)), Json(req))
                .await
                .is_ok()
        );
        let rows = state.db.list_gifts(&owner.to_string()).unwrap();
        rows.last().unwrap().id.parse().unwrap()
    }

    #[tokio::test]
    async fn second_gift_list_for_an_event_is_rejected() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        mk_user(&state, owner);
        let event = mk_event(&state, owner);
        mk_list(&state, owner, event).await;

        let req = CreateGiftListRequest {
            event,
            name: "une autre".into(),
            description: None,
        };
        let Err(err) = create_gift_list(State(state), Extension(claims(owner)), Json(req)).await
        else {
            panic!("expected validation error");
        };
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn reserving_defaults_reserver_to_the_caller() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        mk_user(&state, owner);
        let event = mk_event(&state, owner);
        let list = mk_list(&state, owner, event).await;
        let gift = mk_gift(&state, owner, list).await;

        let req = UpdateGiftRequest {
            name: None,
            description: None,
            price: None,
            url: None,
            image: None,
            status: Some(GiftStatus::Reserved),
            reserved_by: None,
        };
        assert!(
            update_gift(State(state.clone()), Path(gift), Extension(claims(owner)), Json(req))
                .await
                .is_ok()
        );
        let row = state.db.get_gift(&owner.to_string(), &gift.to_string()).unwrap().unwrap();
        assert_eq!(row.status, GiftStatus::Reserved);
        assert_eq!(row.reserved_by.as_deref(), Some(owner.to_string().as_str()));

        // Releasing the gift clears the reserver
        let req = UpdateGiftRequest {
            name: None,
            description: None,
            price: None,
            url: None,
            image: None,
            status: Some(GiftStatus::Available),
            reserved_by: None,
        };
        assert!(
            update_gift(State(state.clone()), Path(gift), Extension(claims(owner)), Json(req))
                .await
                .is_ok()
        );
        let row = state.db.get_gift(&owner.to_string(), &gift.to_string()).unwrap().unwrap();
        assert_eq!(row.reserved_by, None);
    }
}
