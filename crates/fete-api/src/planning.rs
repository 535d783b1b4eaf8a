use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use uuid::Uuid;

use fete_db::fmt_ts;
use fete_db::models::{TaskCategoryRow, TaskRow, VendorRow};
use fete_db::queries::planning::{NewTask, NewVendor, TaskUpdate};
use fete_types::api::{
    Claims, CreateTaskCategoryRequest, CreateTaskRequest, CreateVendorRequest,
    TaskCategoryResponse, TaskResponse, UpdateTaskRequest, UpdateVendorRequest, VendorResponse,
};
use fete_types::models::{TaskPriority, TaskStatus};

use crate::access::{self, Action, ResourceClass};
use crate::error::ApiError;
use crate::parse_uuid;
use crate::state::AppState;

fn category_response(row: &TaskCategoryRow) -> Result<TaskCategoryResponse, ApiError> {
    Ok(TaskCategoryResponse {
        id: parse_uuid(&row.id)?,
        event: parse_uuid(&row.event_id)?,
        name: row.name.clone(),
    })
}

pub(crate) fn task_response(row: &TaskRow) -> Result<TaskResponse, ApiError> {
    Ok(TaskResponse {
        id: parse_uuid(&row.id)?,
        event: parse_uuid(&row.event_id)?,
        category: row.category_id.as_deref().map(parse_uuid).transpose()?,
        title: row.title.clone(),
        description: row.description.clone(),
        status: row.status,
        priority: row.priority,
        due_date: row.due_date.clone(),
        assigned_to: row.assigned_to.as_deref().map(parse_uuid).transpose()?,
        created_by: parse_uuid(&row.created_by)?,
        created_at: row.created_at.clone(),
        completed_at: row.completed_at.clone(),
    })
}

fn vendor_response(row: &VendorRow) -> Result<VendorResponse, ApiError> {
    Ok(VendorResponse {
        id: parse_uuid(&row.id)?,
        event: parse_uuid(&row.event_id)?,
        name: row.name.clone(),
        service_type: row.service_type.clone(),
        contact_name: row.contact_name.clone(),
        contact_email: row.contact_email.clone(),
        contact_phone: row.contact_phone.clone(),
        website: row.website.clone(),
        notes: row.notes.clone(),
    })
}

// -- Task categories --

pub async fn list_task_categories(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_task_categories(&claims.sub.to_string())?;
    let rows = rows.iter().map(category_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

pub async fn create_task_category(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTaskCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.event_owner(&req.event.to_string())?;
    access::authorize(ResourceClass::Task, Action::Write, owner.as_deref(), claims.sub)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("name", "name must not be empty"));
    }

    let id = Uuid::new_v4();
    state
        .db
        .insert_task_category(&id.to_string(), &req.event.to_string(), &req.name)?;

    let row = state
        .db
        .get_task_category(&claims.sub.to_string(), &id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("task category vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(category_response(&row)?)))
}

pub async fn delete_task_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_task_category(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    state.db.delete_task_category(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Tasks --

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_tasks(&claims.sub.to_string())?;
    let rows = rows.iter().map(task_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.event_owner(&req.event.to_string())?;
    access::authorize(ResourceClass::Task, Action::Write, owner.as_deref(), claims.sub)?;
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title", "title must not be empty"));
    }

    let category_id = match req.category {
        Some(category) => {
            let cat = state
                .db
                .get_task_category(&claims.sub.to_string(), &category.to_string())?
                .ok_or(ApiError::NotFound)?;
            if cat.event_id != req.event.to_string() {
                return Err(ApiError::validation("category", "category belongs to another event"));
            }
            Some(cat.id)
        }
        None => None,
    };

    let id = Uuid::new_v4();
    state.db.insert_task(&NewTask {
        id: &id.to_string(),
        event_id: &req.event.to_string(),
        category_id: category_id.as_deref(),
        title: &req.title,
        description: req.description.as_deref().unwrap_or(""),
        status: req.status.unwrap_or(TaskStatus::NotStarted),
        priority: req.priority.unwrap_or(TaskPriority::Medium),
        due_date: req.due_date.map(fmt_ts).as_deref(),
        assigned_to: req.assigned_to.map(|u| u.to_string()).as_deref(),
        created_by: &claims.sub.to_string(),
        created_at: &state.now(),
    })?;

    let row = state
        .db
        .get_task(&claims.sub.to_string(), &id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("task vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(task_response(&row)?)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_task(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(task_response(&row)?))
}

/// Completion tracking mirrors the RSVP rule: entering `completed` stamps
/// `completed_at`, and leaving it clears the stamp.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_task(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let category_id = match req.category {
        Some(category) => {
            let cat = state
                .db
                .get_task_category(&claims.sub.to_string(), &category.to_string())?
                .ok_or(ApiError::NotFound)?;
            if cat.event_id != row.event_id {
                return Err(ApiError::validation("category", "category belongs to another event"));
            }
            Some(cat.id)
        }
        None => row.category_id.clone(),
    };

    let status = req.status.unwrap_or(row.status);
    let completed_at = if status == TaskStatus::Completed {
        row.completed_at.clone().or_else(|| Some(state.now()))
    } else {
        None
    };

    let assigned_to = req.assigned_to.map(|u| u.to_string()).or_else(|| row.assigned_to.clone());
    let due_date = req.due_date.map(fmt_ts).or_else(|| row.due_date.clone());
    let update = TaskUpdate {
        category_id: category_id.as_deref(),
        title: req.title.as_deref().unwrap_or(&row.title),
        description: req.description.as_deref().unwrap_or(&row.description),
        status,
        priority: req.priority.unwrap_or(row.priority),
        due_date: due_date.as_deref(),
        assigned_to: assigned_to.as_deref(),
        completed_at: completed_at.as_deref(),
    };
    state.db.update_task(&row.id, &update)?;

    let row = state
        .db
        .get_task(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(task_response(&row)?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_task(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    state.db.delete_task(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Vendors --

pub async fn list_vendors(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_vendors(&claims.sub.to_string())?;
    let rows = rows.iter().map(vendor_response).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rows))
}

pub async fn create_vendor(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateVendorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = state.db.event_owner(&req.event.to_string())?;
    access::authorize(ResourceClass::Vendor, Action::Write, owner.as_deref(), claims.sub)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("name", "name must not be empty"));
    }

    let id = Uuid::new_v4();
    state.db.insert_vendor(&NewVendor {
        id: &id.to_string(),
        event_id: &req.event.to_string(),
        name: &req.name,
        service_type: &req.service_type,
        contact_name: req.contact_name.as_deref().unwrap_or(""),
        contact_email: req.contact_email.as_deref().unwrap_or(""),
        contact_phone: req.contact_phone.as_deref().unwrap_or(""),
        website: req.website.as_deref().unwrap_or(""),
        notes: req.notes.as_deref().unwrap_or(""),
    })?;

    let row = state
        .db
        .get_vendor(&claims.sub.to_string(), &id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("vendor vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(vendor_response(&row)?)))
}

pub async fn get_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_vendor(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(vendor_response(&row)?))
}

pub async fn update_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateVendorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_vendor(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let update = NewVendor {
        id: &row.id,
        event_id: &row.event_id,
        name: req.name.as_deref().unwrap_or(&row.name),
        service_type: req.service_type.as_deref().unwrap_or(&row.service_type),
        contact_name: req.contact_name.as_deref().unwrap_or(&row.contact_name),
        contact_email: req.contact_email.as_deref().unwrap_or(&row.contact_email),
        contact_phone: req.contact_phone.as_deref().unwrap_or(&row.contact_phone),
        website: req.website.as_deref().unwrap_or(&row.website),
        notes: req.notes.as_deref().unwrap_or(&row.notes),
    };
    state.db.update_vendor(&row.id, &update)?;

    let row = state
        .db
        .get_vendor(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(vendor_response(&row)?))
}

pub async fn delete_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_vendor(&claims.sub.to_string(), &id.to_string())?
        .ok_or(ApiError::NotFound)?;
    state.db.delete_vendor(&row.id)?;
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

    async fn mk_task(state: &AppState, owner: Uuid, event: Uuid) -> Uuid {
        let req = CreateTaskRequest {
            event,
            category: None,
            title: "louer des chaises".into(),
            description: None,
            status: None,
            priority: None,
            due_date: None,
            assigned_to: None,
        };
        assert!(
            create_task(State(state.clone()), Extension(claims(owner)), Json(req))
                .await
                .is_ok()
        );
        let rows = state.db.list_tasks(&owner.to_string()).unwrap();
        rows.last().unwrap().id.parse().unwrap()
    }

    fn status_update(status: TaskStatus) -> UpdateTaskRequest {
        UpdateTaskRequest {
            category: None,
            title: None,
            description: None,
            status: Some(status),
            priority: None,
            due_date: None,
            assigned_to: None,
        }
    }

    #[tokio::test]
    async fn completing_a_task_stamps_and_reopening_clears() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        mk_user(&state, owner);
        let event = mk_event(&state, owner);
        let task = mk_task(&state, owner, event).await;

        assert!(
            update_task(
                State(state.clone()),
                Path(task),
                Extension(claims(owner)),
                Json(status_update(TaskStatus::Completed)),
            )
            .await
            .is_ok()
        );
        let row = state.db.get_task(&owner.to_string(), &task.to_string()).unwrap().unwrap();
        assert!(row.completed_at.is_some());

        assert!(
            update_task(
                State(state.clone()),
                Path(task),
                Extension(claims(owner)),
                Json(status_update(TaskStatus::InProgress)),
            )
            .await
            .is_ok()
        );
        let row = state.db.get_task(&owner.to_string(), &task.to_string()).unwrap().unwrap();
        assert!(row.completed_at.is_none());
    }

    #[tokio::test]
    async fn task_create_against_foreign_event_is_denied() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        let stranger = Uuid::from_u128(2);
        mk_user(&state, owner);
        mk_user(&state, stranger);
        let event = mk_event(&state, owner);

        let req = CreateTaskRequest {
            event,
            category: None,
            title: "t".into(),
            description: None,
            status: None,
            priority: None,
            due_date: None,
            assigned_to: None,
        };
        let Err(err) = create_task(State(state.clone()), Extension(claims(stranger)), Json(req)).await
        else {
            panic!("expected access denied");
        };
        assert!(matches!(err, ApiError::AccessDenied));
        assert!(state.db.list_tasks(&owner.to_string()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_vendor_reads_as_not_found() {
        let state = test_state();
        let owner = Uuid::from_u128(1);
        let stranger = Uuid::from_u128(2);
        mk_user(&state, owner);
        mk_user(&state, stranger);
        let event = mk_event(&state, owner);

        let req = CreateVendorRequest {
            event,
            name: "traiteur".into(),
            service_type: "restauration".into(),
            contact_name: None,
            contact_email: None,
            contact_phone: None,
            website: None,
            notes: None,
        };
        assert!(
            create_vendor(State(state.clone()), Extension(claims(owner)), Json(req))
                .await
                .is_ok()
        );
        let vendor: Uuid = state.db.list_vendors(&owner.to_string()).unwrap()[0].id.parse().unwrap();

        let Err(err) =
            get_vendor(State(state), Path(vendor), Extension(claims(stranger))).await
        else {
            panic!("expected not found");
        };
        assert!(matches!(err, ApiError::NotFound));
    }
}
