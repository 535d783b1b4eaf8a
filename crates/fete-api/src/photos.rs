use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use uuid::Uuid;

use fete_db::models::{AlbumRow, PhotoCommentRow, PhotoRow};
use fete_types::api::{
    AlbumResponse, Claims, CreateAlbumRequest, CreatePhotoCommentRequest, CreatePhotoRequest,
    PhotoCommentResponse, PhotoResponse, UpdateAlbumRequest,
};

use crate::access::{self, Action, ResourceClass};
use crate::error::ApiError;
use crate::parse_uuid;
use crate::state::AppState;

fn album_response(row: &AlbumRow) -> Result<AlbumResponse, ApiError> {
    Ok(AlbumResponse {
        id: parse_uuid(&row.id)?,
        event: parse_uuid(&row.event_id)?,
        name: row.name.clone(),
        description: row.description.clone(),
        cover_image: row.cover_image.clone(),
        created_by: parse_uuid(&row.created_by)?,
        created_at: row.created_at.clone(),
        is_public: row.is_public,
    })
}

fn photo_response(row: &PhotoRow) -> Result<PhotoResponse, ApiError> {
    Ok(PhotoResponse {
        id: parse_uuid(&row.id)?,
        album: parse_uuid(&row.album_id)?,
        image: row.image.clone(),
        caption: row.caption.clone(),
        uploaded_by: parse_uuid(&row.uploaded_by)?,
        uploaded_at: row.uploaded_at.clone(),
        location: row.location.clone(),
    })
}

fn comment_response(row: &PhotoCommentRow) -> Result<PhotoCommentResponse, ApiError> {
    Ok(PhotoCommentResponse {
        id: parse_uuid(&row.id)?,
        photo: parse_uuid(&row.photo_id)?,
        user: parse_uuid(&row.user_id)?,
        comment: row.comment.clone(),
        created_at: row.created_at.clone(),
    })
}

// -- Albums --

pub async fn list_albums(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_albums(&claims.sub.to_string())?;
    let rows = rows.iter().map(album_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

pub async fn create_album(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateAlbumRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.event_owner(&req.event.to_string())?;
    access::authorize(ResourceClass::Album, Action::Write, owner.as_deref(), claims.sub)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("name", "name must not be empty"));
    }

    let id = Uuid::new_v4();
    state.db.insert_album(
        &id.to_string(),
        &req.event.to_string(),
        &req.name,
        req.description.as_deref().unwrap_or(""),
        req.cover_image.as_deref(),
        &claims.sub.to_string(),
        &state.now(),
        req.is_public.unwrap_or(false),
    )?;

    let row = state
        .db
        .get_album(&claims.sub.to_string(), &id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("album vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(album_response(&row)?)))
}

pub async fn get_album(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_album(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(album_response(&row)?))
}

pub async fn update_album(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateAlbumRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_album(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let cover_image = req.cover_image.or_else(|| row.cover_image.clone());
    state.db.update_album(
        &row.id,
        req.name.as_deref().unwrap_or(&row.name),
        req.description.as_deref().unwrap_or(&row.description),
        cover_image.as_deref(),
        req.is_public.unwrap_or(row.is_public),
    )?;

    let row = state
        .db
        .get_album(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(album_response(&row)?))
}

pub async fn delete_album(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_album(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    state.db.delete_album(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Photos --

pub async fn list_photos(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_photos(&claims.sub.to_string())?;
    let rows = rows.iter().map(photo_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

pub async fn create_photo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePhotoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.album_owner(&req.album.to_string())?;
    access::authorize(ResourceClass::Photo, Action::Write, owner.as_deref(), claims.sub)?;
    if req.image.trim().is_empty() {
        return Err(ApiError::validation("image", "image reference must not be empty"));
    }

    let id = Uuid::new_v4();
    state.db.insert_photo(
        &id.to_string(),
        &req.album.to_string(),
        &req.image,
        req.caption.as_deref().unwrap_or(""),
        &claims.sub.to_string(),
        &state.now(),
        req.location.as_deref().unwrap_or(""),
    )?;

    let row = state
        .db
        .get_photo(&claims.sub.to_string(), &id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("photo vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(photo_response(&row)?)))
}

pub async fn get_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_photo(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(photo_response(&row)?))
}

pub async fn delete_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_photo(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    state.db.delete_photo(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Comments --

pub async fn list_photo_comments(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    // The photo itself must be visible before its comments are listed
    state
        .db
        .get_photo(&claims.sub.to_string(), &photo_id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let rows = state
        .db
        .list_photo_comments(&claims.sub.to_string(), &photo_id.to_string())?;
    let rows = rows.iter().map(comment_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

pub async fn create_photo_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePhotoCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.photo_owner(&req.photo.to_string())?;
    access::authorize(ResourceClass::Photo, Action::Write, owner.as_deref(), claims.sub)?;
    if req.comment.trim().is_empty() {
        return Err(ApiError::validation("comment", "comment must not be empty"));
    }

    let id = Uuid::new_v4();
    let created_at = state.now();
    state.db.insert_photo_comment(
        &id.to_string(),
        &req.photo.to_string(),
        &claims.sub.to_string(),
        &req.comment,
        &created_at,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(PhotoCommentResponse {
            id,
            photo: req.photo,
            user: claims.sub,
            comment: req.comment,
            created_at,
        }),
    ))
}

pub async fn delete_photo_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    // Comment deletion follows the album's ownership chain; a foreign
    // comment reads as missing
    match state.db.photo_comment_owner(&id.to_string())? {
        Some(owner) if owner == claims.sub.to_string() => {}
        Some(_) | None => return Err(ApiError::NotFound),
    }

    state.db.delete_photo_comment(&id.to_string())?;
    Ok(StatusCode::NO_CONTENT)
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

    async fn mk_album(state: &AppState, owner: Uuid, event: Uuid) -> Uuid {
        let req = CreateAlbumRequest {
            event,
            name: "album".into(),
            description: None,
            cover_image: None,
            is_public: None,
        };
        assert!(
            create_album(State(state.clone()), Extension(claims(owner)), Json(req))
                .await
                .is_ok()
        );
        let rows = state.db.list_albums(&owner.to_string()).unwrap();
        rows.last().unwrap().id.parse().unwrap()
    }

    #[tokio::test]
    async fn photo_upload_into_foreign_album_is_denied() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        let stranger = Uuid::from_u128(2);
        mk_user(&state, owner);
        mk_user(&state, stranger);
        let event = mk_event(&state, owner);
        let album = mk_album(&state, owner, event).await;

        let req = CreatePhotoRequest {
            album,
            image: "photos/p1.jpg".into(),
            caption: None,
            location: None,
        };
        let Err(err) = create_photo(State(state.clone()), Extension(claims(stranger)), Json(req)).await
        else {
            panic!("expected access denied");
        };
        assert!(matches!(err, ApiError::AccessDenied));
        assert!(state.db.list_photos(&owner.to_string()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn comments_are_only_listed_for_visible_photos() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        let stranger = Uuid::from_u128(2);
        mk_user(&state, owner);
        mk_user(&state, stranger);
        let event = mk_event(&state, owner);
        let album = mk_album(&state, owner, event).await;

        let req = CreatePhotoRequest {
            album,
            image: "photos/p1.jpg".into(),
            caption: None,
            location: None,
        };
        assert!(
            create_photo(State(state.clone()), Extension(claims(owner)), Json(req))
                .await
                .is_ok()
        );
        let photo: Uuid = state.db.list_photos(&owner.to_string()).unwrap()[0].id.parse().unwrap();

        let Err(err) =
            list_photo_comments(State(state.clone()), Path(photo), Extension(claims(stranger))).await
        else {
            panic!("expected not found");
        };
        assert!(matches!(err, ApiError::NotFound));

        assert!(
            list_photo_comments(State(state), Path(photo), Extension(claims(owner)))
                .await
                .is_ok()
        );
    }
}
