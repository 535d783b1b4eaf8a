use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{GiftStatus, ResponseStatus, TaskPriority, TaskStatus};

// -- JWT Claims --

/// JWT claims shared between the auth handlers (token issuance) and the
/// middleware (token validation). Canonical definition lives here in
/// fete-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth / users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// PATCH /api/users/profile. `id`, `username` and `email` are read-only.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub language: String,
    pub notification_email: bool,
    pub notification_push: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePreferencesRequest {
    pub language: Option<String>,
    pub notification_email: Option<bool>,
    pub notification_push: Option<bool>,
}

// -- Event types --

#[derive(Debug, Serialize)]
pub struct EventTypeResponse {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    pub color: String,
}

// -- Events --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEventRequest {
    pub title: String,
    pub event_type: Uuid,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_private: Option<bool>,
}

/// Distinguishes an omitted field from an explicit `null`: absent stays
/// `None` (via `default`), `null` arrives as `Some(None)`.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub event_type: Option<Uuid>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    /// `null` clears the end date; omitting the field keeps it.
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub is_private: Option<bool>,
}

/// List-view shape of an event. Timestamps are echoed in the storage
/// format (`YYYY-MM-DD HH:MM:SS`, UTC).
#[derive(Debug, Serialize)]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub event_type: Uuid,
    pub event_type_name: String,
    pub event_type_color: String,
    pub description: String,
    pub location: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub created_by: Uuid,
    pub created_at: String,
    pub updated_at: String,
    pub is_private: bool,
    pub reminders: Vec<ReminderResponse>,
}

/// Detail-view shape: the summary plus nested collections.
#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub summary: EventSummary,
    pub guests: Vec<GuestResponse>,
    pub tasks: Vec<TaskResponse>,
    pub gift_list: Option<GiftListResponse>,
}

// -- Reminders --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReminderRequest {
    pub event: Uuid,
    pub reminder_date: DateTime<Utc>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateReminderRequest {
    pub reminder_date: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub sent: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ReminderResponse {
    pub id: Uuid,
    pub event: Uuid,
    pub reminder_date: String,
    pub message: String,
    pub sent: bool,
}

// -- Guests --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGuestGroupRequest {
    pub event: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct GuestGroupResponse {
    pub id: Uuid,
    pub event: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGuestRequest {
    pub event: Uuid,
    #[serde(default)]
    pub group: Option<Uuid>,
    #[serde(default)]
    pub user: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub plus_ones: Option<u32>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateGuestRequest {
    pub group: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub response_status: Option<ResponseStatus>,
    pub plus_ones: Option<u32>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GuestResponse {
    pub id: Uuid,
    pub event: Uuid,
    pub group: Option<Uuid>,
    pub user: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub response_status: ResponseStatus,
    pub plus_ones: u32,
    pub note: String,
    pub invited_at: String,
    pub responded_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInvitationRequest {
    pub guest: Uuid,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub id: Uuid,
    pub guest: Uuid,
    pub message: String,
    pub sent_at: String,
    pub viewed_at: Option<String>,
    pub unique_code: String,
}

// -- Planning --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskCategoryRequest {
    pub event: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TaskCategoryResponse {
    pub id: Uuid,
    pub event: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    pub event: Uuid,
    #[serde(default)]
    pub category: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskRequest {
    pub category: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub event: Uuid,
    pub category: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: String,
    pub completed_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateVendorRequest {
    pub event: Uuid,
    pub name: String,
    pub service_type: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateVendorRequest {
    pub name: Option<String>,
    pub service_type: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VendorResponse {
    pub id: Uuid,
    pub event: Uuid,
    pub name: String,
    pub service_type: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub website: String,
    pub notes: String,
}

// -- Gifts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGiftListRequest {
    pub event: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GiftListResponse {
    pub id: Uuid,
    pub event: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGiftRequest {
    pub list: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateGiftRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub status: Option<GiftStatus>,
    pub reserved_by: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct GiftResponse {
    pub id: Uuid,
    pub list: Uuid,
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub url: String,
    pub image: Option<String>,
    pub status: GiftStatus,
    pub reserved_by: Option<Uuid>,
    pub created_at: String,
}

// -- Photos --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAlbumRequest {
    pub event: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAlbumRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct AlbumResponse {
    pub id: Uuid,
    pub event: Uuid,
    pub name: String,
    pub description: String,
    pub cover_image: Option<String>,
    pub created_by: Uuid,
    pub created_at: String,
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePhotoRequest {
    pub album: Uuid,
    /// Path or URL reference into the external image store.
    pub image: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub id: Uuid,
    pub album: Uuid,
    pub image: String,
    pub caption: String,
    pub uploaded_by: Uuid,
    pub uploaded_at: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePhotoCommentRequest {
    pub photo: Uuid,
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct PhotoCommentResponse {
    pub id: Uuid,
    pub photo: Uuid,
    pub user: Uuid,
    pub comment: String,
    pub created_at: String,
}

// -- Messaging --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMessageGroupRequest {
    pub event: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct MessageGroupResponse {
    pub id: Uuid,
    pub event: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddGroupMemberRequest {
    pub group: Uuid,
    pub user: Uuid,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct GroupMemberResponse {
    pub id: Uuid,
    pub group: Uuid,
    pub user: Uuid,
    pub joined_at: String,
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub group: Uuid,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub group: Uuid,
    pub sender: Uuid,
    pub content: String,
    pub sent_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReadReceiptRequest {
    pub message: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ReadReceiptResponse {
    pub id: Uuid,
    pub message: Uuid,
    pub user: Uuid,
    pub read_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_patch_end_date_distinguishes_null_from_absent() {
        let req: UpdateEventRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.end_date, None);

        let req: UpdateEventRequest = serde_json::from_str(r#"{"end_date": null}"#).unwrap();
        assert_eq!(req.end_date, Some(None));

        let req: UpdateEventRequest =
            serde_json::from_str(r#"{"end_date": "2024-06-12T00:00:00Z"}"#).unwrap();
        assert!(matches!(req.end_date, Some(Some(_))));
    }
}
