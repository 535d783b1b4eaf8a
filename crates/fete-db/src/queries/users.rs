use crate::Database;
use crate::models::{PreferenceRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, first_name, last_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                (id, username, email, password_hash, first_name, last_name, now),
            )?;
            // Every account starts with default preferences
            conn.execute(
                "INSERT INTO user_preferences (user_id) VALUES (?1)",
                [id],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn update_profile(
        &self,
        id: &str,
        first_name: &str,
        last_name: &str,
        phone_number: &str,
        profile_picture: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET first_name = ?2, last_name = ?3, phone_number = ?4, profile_picture = ?5
                 WHERE id = ?1",
                (id, first_name, last_name, phone_number, profile_picture),
            )?;
            Ok(())
        })
    }

    pub fn get_preferences(&self, user_id: &str) -> Result<Option<PreferenceRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT user_id, language, notification_email, notification_push
                     FROM user_preferences WHERE user_id = ?1",
                    [user_id],
                    |row| {
                        Ok(PreferenceRow {
                            user_id: row.get(0)?,
                            language: row.get(1)?,
                            notification_email: row.get(2)?,
                            notification_push: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_preferences(
        &self,
        user_id: &str,
        language: &str,
        notification_email: bool,
        notification_push: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE user_preferences SET language = ?2, notification_email = ?3, notification_push = ?4
                 WHERE user_id = ?1",
                (user_id, language, notification_email, notification_push),
            )?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, email, password, first_name, last_name, phone_number, profile_picture, created_at
         FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                first_name: row.get(4)?,
                last_name: row.get(5)?,
                phone_number: row.get(6)?,
                profile_picture: row.get(7)?,
                created_at: row.get(8)?,
            })
        })
        .optional()?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn registration_creates_default_preferences() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "alice", "alice@example.com", "hash", "", "", "2024-01-01 00:00:00")
            .unwrap();

        let prefs = db.get_preferences("u1").unwrap().unwrap();
        assert_eq!(prefs.language, "fr");
        assert!(prefs.notification_email);
        assert!(prefs.notification_push);
    }

    #[test]
    fn duplicate_email_is_rejected_by_schema() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "alice", "a@example.com", "h", "", "", "2024-01-01 00:00:00")
            .unwrap();
        let err = db.create_user("u2", "bob", "a@example.com", "h", "", "", "2024-01-01 00:00:00");
        assert!(err.is_err());
    }
}
