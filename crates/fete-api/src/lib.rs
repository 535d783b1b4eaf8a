pub mod access;
pub mod clock;
pub mod error;
pub mod events;
pub mod gifts;
pub mod guests;
pub mod messaging;
pub mod middleware;
pub mod photos;
pub mod planning;
pub mod reminders;
pub mod state;
pub mod users;

use error::ApiError;
use uuid::Uuid;

/// IDs are stored as TEXT; a row that fails to parse back is corrupt data,
/// not a client error.
pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, ApiError> {
    s.parse()
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("corrupt id in database: {}", s)))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use fete_db::Database;

    use crate::clock::FixedClock;
    use crate::state::{AppState, AppStateInner};

    /// In-memory state pinned to 2024-06-01 12:00:00 UTC.
    pub(crate) fn test_state() -> AppState {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
            clock: Arc::new(FixedClock(now)),
        })
    }
}
