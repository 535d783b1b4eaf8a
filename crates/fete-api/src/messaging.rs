use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use uuid::Uuid;

use fete_db::models::{GroupMemberRow, MessageGroupRow, MessageRow, ReadReceiptRow};
use fete_types::api::{
    AddGroupMemberRequest, Claims, CreateMessageGroupRequest, CreateReadReceiptRequest,
    GroupMemberResponse, MessageGroupResponse, MessageResponse, ReadReceiptResponse,
    SendMessageRequest,
};

use crate::access::{self, Action, ResourceClass};
use crate::error::ApiError;
use crate::parse_uuid;
use crate::state::AppState;

fn group_response(row: &MessageGroupRow) -> Result<MessageGroupResponse, ApiError> {
    Ok(MessageGroupResponse {
        id: parse_uuid(&row.id)?,
        event: parse_uuid(&row.event_id)?,
        name: row.name.clone(),
        created_by: parse_uuid(&row.created_by)?,
        created_at: row.created_at.clone(),
    })
}

fn member_response(row: &GroupMemberRow) -> Result<GroupMemberResponse, ApiError> {
    Ok(GroupMemberResponse {
        id: parse_uuid(&row.id)?,
        group: parse_uuid(&row.group_id)?,
        user: parse_uuid(&row.user_id)?,
        joined_at: row.joined_at.clone(),
        is_admin: row.is_admin,
    })
}

fn message_response(row: &MessageRow) -> Result<MessageResponse, ApiError> {
    Ok(MessageResponse {
        id: parse_uuid(&row.id)?,
        group: parse_uuid(&row.group_id)?,
        sender: parse_uuid(&row.sender_id)?,
        content: row.content.clone(),
        sent_at: row.sent_at.clone(),
    })
}

fn receipt_response(row: &ReadReceiptRow) -> Result<ReadReceiptResponse, ApiError> {
    Ok(ReadReceiptResponse {
        id: parse_uuid(&row.id)?,
        message: parse_uuid(&row.message_id)?,
        user: parse_uuid(&row.user_id)?,
        read_at: row.read_at.clone(),
    })
}

// -- Message groups --

pub async fn list_message_groups(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_message_groups(&claims.sub.to_string())?;
    let rows = rows.iter().map(group_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

/// Creating a group also enrolls the creator as its first admin member.
pub async fn create_message_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateMessageGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.event_owner(&req.event.to_string())?;
    access::authorize(ResourceClass::MessageGroup, Action::Write, owner.as_deref(), claims.sub)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("name", "name must not be empty"));
    }

    let id = Uuid::new_v4();
    state.db.insert_message_group(
        &id.to_string(),
        &req.event.to_string(),
        &req.name,
        &claims.sub.to_string(),
        &state.now(),
    )?;
    state.db.insert_group_member(
        &Uuid::new_v4().to_string(),
        &id.to_string(),
        &claims.sub.to_string(),
        &state.now(),
        true,
    )?;

    let row = state
        .db
        .get_message_group(&claims.sub.to_string(), &id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("message group vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(group_response(&row)?)))
}

pub async fn get_message_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_message_group(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(group_response(&row)?))
}

pub async fn delete_message_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_message_group(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    state.db.delete_message_group(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Members --

pub async fn list_group_members(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .get_message_group(&claims.sub.to_string(), &group_id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let rows = state
        .db
        .list_group_members(&claims.sub.to_string(), &group_id.to_string())?;
    let rows = rows.iter().map(member_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

pub async fn add_group_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddGroupMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.message_group_owner(&req.group.to_string())?;
    access::authorize(ResourceClass::MessageGroup, Action::Write, owner.as_deref(), claims.sub)?;

    if state.db.get_user_by_id(&req.user.to_string())?.is_none() {
        return Err(ApiError::validation("user", "unknown user"));
    }
    // The (group, user) pair is unique; the schema backs this up
    if state.db.group_member_exists(&req.group.to_string(), &req.user.to_string())? {
        return Err(ApiError::validation("user", "already a member of this group"));
    }

    let id = Uuid::new_v4();
    state.db.insert_group_member(
        &id.to_string(),
        &req.group.to_string(),
        &req.user.to_string(),
        &state.now(),
        req.is_admin.unwrap_or(false),
    )?;

    let row = state
        .db
        .get_group_member(&claims.sub.to_string(), &id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("group member vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(member_response(&row)?)))
}

pub async fn remove_group_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_group_member(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    state.db.delete_group_member(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Messages --

pub async fn list_messages(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .get_message_group(&claims.sub.to_string(), &group_id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let rows = state.db.list_messages(&claims.sub.to_string(), &group_id.to_string())?;
    let rows = rows.iter().map(message_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.message_group_owner(&req.group.to_string())?;
    access::authorize(ResourceClass::MessageGroup, Action::Write, owner.as_deref(), claims.sub)?;
    if req.content.trim().is_empty() {
        return Err(ApiError::validation("content", "content must not be empty"));
    }

    let id = Uuid::new_v4();
    let sent_at = state.now();
    state.db.insert_message(
        &id.to_string(),
        &req.group.to_string(),
        &claims.sub.to_string(),
        &req.content,
        &sent_at,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            id,
            group: req.group,
            sender: claims.sub,
            content: req.content,
            sent_at,
        }),
    ))
}

// -- Read receipts --

pub async fn list_read_receipts(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    match state.db.message_owner(&message_id.to_string())? {
        Some(owner) if owner == claims.sub.to_string() => {}
        Some(_) | None => return Err(ApiError::NotFound),
    }

    let rows = state
        .db
        .list_read_receipts(&claims.sub.to_string(), &message_id.to_string())?;
    let rows = rows.iter().map(receipt_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

/// Marking a message read is idempotent in intent but not in effect: the
/// second attempt for the same (message, user) pair is a validation error.
pub async fn create_read_receipt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateReadReceiptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.message_owner(&req.message.to_string())?;
    access::authorize(ResourceClass::MessageGroup, Action::Write, owner.as_deref(), claims.sub)?;

    if state.db.read_receipt_exists(&req.message.to_string(), &claims.sub.to_string())? {
        return Err(ApiError::validation("message", "message already marked as read"));
    }

    let id = Uuid::new_v4();
    let read_at = state.now();
    state.db.insert_read_receipt(
        &id.to_string(),
        &req.message.to_string(),
        &claims.sub.to_string(),
        &read_at,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(ReadReceiptResponse {
            id,
            message: req.message,
            user: claims.sub,
            read_at,
        }),
    ))
}
