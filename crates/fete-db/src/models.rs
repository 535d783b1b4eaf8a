//! Database row types — these map directly to SQLite rows.
//! Distinct from the fete-types API models to keep the DB layer independent;
//! status columns are parsed into their enums at the row boundary.

use fete_types::models::{GiftStatus, ResponseStatus, TaskPriority, TaskStatus};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub profile_picture: Option<String>,
    pub created_at: String,
}

pub struct PreferenceRow {
    pub user_id: String,
    pub language: String,
    pub notification_email: bool,
    pub notification_push: bool,
}

pub struct EventTypeRow {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
}

/// Event row joined with its type's name and color, which every view shape
/// exposes alongside the raw foreign key.
pub struct EventRow {
    pub id: String,
    pub title: String,
    pub event_type_id: String,
    pub event_type_name: String,
    pub event_type_color: String,
    pub description: String,
    pub location: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
    pub is_private: bool,
}

pub struct ReminderRow {
    pub id: String,
    pub event_id: String,
    pub reminder_date: String,
    pub message: String,
    pub sent: bool,
}

pub struct GuestGroupRow {
    pub id: String,
    pub event_id: String,
    pub name: String,
}

pub struct GuestRow {
    pub id: String,
    pub event_id: String,
    pub group_id: Option<String>,
    pub user_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub response_status: ResponseStatus,
    pub plus_ones: u32,
    pub note: String,
    pub invited_at: String,
    pub responded_at: Option<String>,
}

pub struct InvitationRow {
    pub id: String,
    pub guest_id: String,
    pub message: String,
    pub sent_at: String,
    pub viewed_at: Option<String>,
    pub unique_code: String,
}

pub struct TaskCategoryRow {
    pub id: String,
    pub event_id: String,
    pub name: String,
}

pub struct TaskRow {
    pub id: String,
    pub event_id: String,
    pub category_id: Option<String>,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<String>,
    pub assigned_to: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub completed_at: Option<String>,
}

pub struct VendorRow {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub service_type: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub website: String,
    pub notes: String,
}

pub struct GiftListRow {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
}

pub struct GiftRow {
    pub id: String,
    pub list_id: String,
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub url: String,
    pub image: Option<String>,
    pub status: GiftStatus,
    pub reserved_by: Option<String>,
    pub created_at: String,
}

pub struct AlbumRow {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub description: String,
    pub cover_image: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub is_public: bool,
}

pub struct PhotoRow {
    pub id: String,
    pub album_id: String,
    pub image: String,
    pub caption: String,
    pub uploaded_by: String,
    pub uploaded_at: String,
    pub location: String,
}

pub struct PhotoCommentRow {
    pub id: String,
    pub photo_id: String,
    pub user_id: String,
    pub comment: String,
    pub created_at: String,
}

pub struct MessageGroupRow {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: String,
}

pub struct GroupMemberRow {
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    pub joined_at: String,
    pub is_admin: bool,
}

pub struct MessageRow {
    pub id: String,
    pub group_id: String,
    pub sender_id: String,
    pub content: String,
    pub sent_at: String,
}

pub struct ReadReceiptRow {
    pub id: String,
    pub message_id: String,
    pub user_id: String,
    pub read_at: String,
}
