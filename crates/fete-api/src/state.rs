use std::sync::Arc;

use fete_db::Database;

use crate::clock::Clock;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub clock: Arc<dyn Clock>,
}

impl AppStateInner {
    /// Current wall-clock time in the storage format, read per request.
    pub fn now(&self) -> String {
        fete_db::fmt_ts(self.clock.now())
    }
}
