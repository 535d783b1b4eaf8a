use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use fete_api::clock::SystemClock;
use fete_api::middleware::require_auth;
use fete_api::state::{AppState, AppStateInner};
use fete_api::{events, gifts, guests, messaging, photos, planning, reminders, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fete=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("FETE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("FETE_DB_PATH").unwrap_or_else(|_| "fete.db".into());
    let host = std::env::var("FETE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("FETE_PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()?;

    // Init database
    let db = fete_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        clock: Arc::new(SystemClock),
    });

    // Routes
    let public_routes = Router::new()
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login));

    let protected_routes = Router::new()
        // Users
        .route("/api/users/profile", get(users::get_profile).patch(users::update_profile))
        .route(
            "/api/users/preferences",
            get(users::get_preferences).patch(users::update_preferences),
        )
        // Events
        .route("/api/events/types", get(events::list_event_types))
        .route("/api/events/events", get(events::list_events).post(events::create_event))
        .route("/api/events/events/upcoming", get(events::upcoming))
        .route("/api/events/events/by_month", get(events::by_month))
        .route(
            "/api/events/events/{id}",
            get(events::get_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        // Reminders
        .route(
            "/api/events/reminders",
            get(reminders::list_reminders).post(reminders::create_reminder),
        )
        .route(
            "/api/events/reminders/{id}",
            get(reminders::get_reminder)
                .patch(reminders::update_reminder)
                .delete(reminders::delete_reminder),
        )
        // Guests
        .route(
            "/api/guests/groups",
            get(guests::list_guest_groups).post(guests::create_guest_group),
        )
        .route("/api/guests/groups/{id}", delete(guests::delete_guest_group))
        .route("/api/guests/guests", get(guests::list_guests).post(guests::create_guest))
        .route(
            "/api/guests/guests/{id}",
            get(guests::get_guest).patch(guests::update_guest).delete(guests::delete_guest),
        )
        .route(
            "/api/guests/invitations",
            get(guests::list_invitations).post(guests::create_invitation),
        )
        // Planning
        .route(
            "/api/planning/categories",
            get(planning::list_task_categories).post(planning::create_task_category),
        )
        .route("/api/planning/categories/{id}", delete(planning::delete_task_category))
        .route("/api/planning/tasks", get(planning::list_tasks).post(planning::create_task))
        .route(
            "/api/planning/tasks/{id}",
            get(planning::get_task).patch(planning::update_task).delete(planning::delete_task),
        )
        .route("/api/planning/vendors", get(planning::list_vendors).post(planning::create_vendor))
        .route(
            "/api/planning/vendors/{id}",
            get(planning::get_vendor)
                .patch(planning::update_vendor)
                .delete(planning::delete_vendor),
        )
        // Gifts
        .route("/api/gifts/lists", get(gifts::list_gift_lists).post(gifts::create_gift_list))
        .route(
            "/api/gifts/lists/{id}",
            get(gifts::get_gift_list).delete(gifts::delete_gift_list),
        )
        .route("/api/gifts/gifts", get(gifts::list_gifts).post(gifts::create_gift))
        .route(
            "/api/gifts/gifts/{id}",
            get(gifts::get_gift).patch(gifts::update_gift).delete(gifts::delete_gift),
        )
        // Photos
        .route("/api/photos/albums", get(photos::list_albums).post(photos::create_album))
        .route(
            "/api/photos/albums/{id}",
            get(photos::get_album).patch(photos::update_album).delete(photos::delete_album),
        )
        .route("/api/photos/photos", get(photos::list_photos).post(photos::create_photo))
        .route(
            "/api/photos/photos/{id}",
            get(photos::get_photo).delete(photos::delete_photo),
        )
        .route("/api/photos/photos/{id}/comments", get(photos::list_photo_comments))
        .route("/api/photos/comments", post(photos::create_photo_comment))
        .route("/api/photos/comments/{id}", delete(photos::delete_photo_comment))
        // Messaging
        .route(
            "/api/messaging/groups",
            get(messaging::list_message_groups).post(messaging::create_message_group),
        )
        .route(
            "/api/messaging/groups/{id}",
            get(messaging::get_message_group).delete(messaging::delete_message_group),
        )
        .route("/api/messaging/groups/{id}/members", get(messaging::list_group_members))
        .route("/api/messaging/groups/{id}/messages", get(messaging::list_messages))
        .route("/api/messaging/members", post(messaging::add_group_member))
        .route("/api/messaging/members/{id}", delete(messaging::remove_group_member))
        .route("/api/messaging/messages", post(messaging::send_message))
        .route(
            "/api/messaging/messages/{id}/receipts",
            get(messaging::list_read_receipts),
        )
        .route("/api/messaging/receipts", post(messaging::create_read_receipt))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Fête server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
