use crate::Database;
use crate::models::ReminderRow;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row};

const REMINDER_SELECT: &str =
    "SELECT r.id, r.event_id, r.reminder_date, r.message, r.sent FROM reminders r";

fn map_reminder_row(row: &Row) -> rusqlite::Result<ReminderRow> {
    Ok(ReminderRow {
        id: row.get(0)?,
        event_id: row.get(1)?,
        reminder_date: row.get(2)?,
        message: row.get(3)?,
        sent: row.get(4)?,
    })
}

impl Database {
    pub fn insert_reminder(
        &self,
        id: &str,
        event_id: &str,
        reminder_date: &str,
        message: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reminders (id, event_id, reminder_date, message) VALUES (?1, ?2, ?3, ?4)",
                (id, event_id, reminder_date, message),
            )?;
            Ok(())
        })
    }

    /// All reminders attached to the caller's events.
    pub fn list_reminders(&self, owner: &str) -> Result<Vec<ReminderRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN events e ON r.event_id = e.id WHERE e.created_by = ?1
                 ORDER BY r.reminder_date",
                REMINDER_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner], map_reminder_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_reminders_for_event(&self, event_id: &str) -> Result<Vec<ReminderRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE r.event_id = ?1 ORDER BY r.reminder_date",
                REMINDER_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([event_id], map_reminder_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_reminder(&self, owner: &str, id: &str) -> Result<Option<ReminderRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN events e ON r.event_id = e.id WHERE r.id = ?1 AND e.created_by = ?2",
                REMINDER_SELECT
            );
            let row = conn.query_row(&sql, [id, owner], map_reminder_row).optional()?;
            Ok(row)
        })
    }

    /// The `sent` flag is monotonic: `MAX(sent, ?)` means an update can set
    /// it but never clear it.
    pub fn update_reminder(
        &self,
        id: &str,
        reminder_date: &str,
        message: &str,
        sent: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE reminders SET reminder_date = ?2, message = ?3, sent = MAX(sent, ?4)
                 WHERE id = ?1",
                (id, reminder_date, message, sent),
            )?;
            Ok(())
        })
    }

    pub fn delete_reminder(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM reminders WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}
