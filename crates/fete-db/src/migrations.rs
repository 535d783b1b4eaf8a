use anyhow::Result;
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            username        TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            first_name      TEXT NOT NULL DEFAULT '',
            last_name       TEXT NOT NULL DEFAULT '',
            phone_number    TEXT NOT NULL DEFAULT '',
            profile_picture TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS user_preferences (
            user_id             TEXT PRIMARY KEY REFERENCES users(id),
            language            TEXT NOT NULL DEFAULT 'fr',
            notification_email  INTEGER NOT NULL DEFAULT 1,
            notification_push   INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS event_types (
            id      TEXT PRIMARY KEY,
            name    TEXT NOT NULL UNIQUE,
            icon    TEXT NOT NULL DEFAULT '',
            color   TEXT NOT NULL DEFAULT '#6200EE'
        );

        CREATE TABLE IF NOT EXISTS events (
            id              TEXT PRIMARY KEY,
            title           TEXT NOT NULL,
            event_type_id   TEXT NOT NULL REFERENCES event_types(id),
            description     TEXT NOT NULL DEFAULT '',
            location        TEXT NOT NULL DEFAULT '',
            start_date      TEXT NOT NULL,
            end_date        TEXT,
            created_by      TEXT NOT NULL REFERENCES users(id),
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL,
            is_private      INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_events_owner
            ON events(created_by, start_date);

        CREATE TABLE IF NOT EXISTS reminders (
            id              TEXT PRIMARY KEY,
            event_id        TEXT NOT NULL REFERENCES events(id),
            reminder_date   TEXT NOT NULL,
            message         TEXT NOT NULL DEFAULT '',
            sent            INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_reminders_event
            ON reminders(event_id);

        CREATE TABLE IF NOT EXISTS guest_groups (
            id          TEXT PRIMARY KEY,
            event_id    TEXT NOT NULL REFERENCES events(id),
            name        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS guests (
            id              TEXT PRIMARY KEY,
            event_id        TEXT NOT NULL REFERENCES events(id),
            group_id        TEXT REFERENCES guest_groups(id) ON DELETE SET NULL,
            user_id         TEXT REFERENCES users(id),
            name            TEXT NOT NULL,
            email           TEXT NOT NULL DEFAULT '',
            phone           TEXT NOT NULL DEFAULT '',
            response_status TEXT NOT NULL DEFAULT 'pending',
            plus_ones       INTEGER NOT NULL DEFAULT 0,
            note            TEXT NOT NULL DEFAULT '',
            invited_at      TEXT NOT NULL,
            responded_at    TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_guests_event
            ON guests(event_id);

        CREATE TABLE IF NOT EXISTS invitations (
            id          TEXT PRIMARY KEY,
            guest_id    TEXT NOT NULL REFERENCES guests(id),
            message     TEXT NOT NULL DEFAULT '',
            sent_at     TEXT NOT NULL,
            viewed_at   TEXT,
            unique_code TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS task_categories (
            id          TEXT PRIMARY KEY,
            event_id    TEXT NOT NULL REFERENCES events(id),
            name        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id              TEXT PRIMARY KEY,
            event_id        TEXT NOT NULL REFERENCES events(id),
            category_id     TEXT REFERENCES task_categories(id) ON DELETE SET NULL,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL DEFAULT '',
            status          TEXT NOT NULL DEFAULT 'not_started',
            priority        TEXT NOT NULL DEFAULT 'medium',
            due_date        TEXT,
            assigned_to     TEXT REFERENCES users(id),
            created_by      TEXT NOT NULL REFERENCES users(id),
            created_at      TEXT NOT NULL,
            completed_at    TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_event
            ON tasks(event_id);

        CREATE TABLE IF NOT EXISTS vendors (
            id              TEXT PRIMARY KEY,
            event_id        TEXT NOT NULL REFERENCES events(id),
            name            TEXT NOT NULL,
            service_type    TEXT NOT NULL,
            contact_name    TEXT NOT NULL DEFAULT '',
            contact_email   TEXT NOT NULL DEFAULT '',
            contact_phone   TEXT NOT NULL DEFAULT '',
            website         TEXT NOT NULL DEFAULT '',
            notes           TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS gift_lists (
            id          TEXT PRIMARY KEY,
            event_id    TEXT NOT NULL UNIQUE REFERENCES events(id),
            name        TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS gifts (
            id          TEXT PRIMARY KEY,
            list_id     TEXT NOT NULL REFERENCES gift_lists(id),
            name        TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            price       REAL,
            url         TEXT NOT NULL DEFAULT '',
            image       TEXT,
            status      TEXT NOT NULL DEFAULT 'available',
            reserved_by TEXT REFERENCES users(id),
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_gifts_list
            ON gifts(list_id);

        CREATE TABLE IF NOT EXISTS albums (
            id          TEXT PRIMARY KEY,
            event_id    TEXT NOT NULL REFERENCES events(id),
            name        TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            cover_image TEXT,
            created_by  TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL,
            is_public   INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS photos (
            id          TEXT PRIMARY KEY,
            album_id    TEXT NOT NULL REFERENCES albums(id),
            image       TEXT NOT NULL,
            caption     TEXT NOT NULL DEFAULT '',
            uploaded_by TEXT NOT NULL REFERENCES users(id),
            uploaded_at TEXT NOT NULL,
            location    TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_photos_album
            ON photos(album_id);

        CREATE TABLE IF NOT EXISTS photo_comments (
            id          TEXT PRIMARY KEY,
            photo_id    TEXT NOT NULL REFERENCES photos(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            comment     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS message_groups (
            id          TEXT PRIMARY KEY,
            event_id    TEXT NOT NULL REFERENCES events(id),
            name        TEXT NOT NULL,
            created_by  TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS message_group_members (
            id          TEXT PRIMARY KEY,
            group_id    TEXT NOT NULL REFERENCES message_groups(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            joined_at   TEXT NOT NULL,
            is_admin    INTEGER NOT NULL DEFAULT 0,
            UNIQUE(group_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            group_id    TEXT NOT NULL REFERENCES message_groups(id),
            sender_id   TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            sent_at     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_group
            ON messages(group_id, sent_at);

        CREATE TABLE IF NOT EXISTS read_receipts (
            id          TEXT PRIMARY KEY,
            message_id  TEXT NOT NULL REFERENCES messages(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            read_at     TEXT NOT NULL,
            UNIQUE(message_id, user_id)
        );
        ",
    )?;

    seed_event_types(conn)?;

    info!("Database migrations complete");
    Ok(())
}

/// The fixed reference set of event types. Seeding is idempotent: rows are
/// matched by name, so re-running never duplicates them.
const EVENT_TYPES: [(&str, &str, &str); 9] = [
    ("Anniversaire", "cake", "#FF4081"),
    ("Mariage", "favorite", "#AB47BC"),
    ("Fête", "celebration", "#26A69A"),
    ("Réunion", "people", "#42A5F5"),
    ("Conférence", "mic", "#5C6BC0"),
    ("Voyage", "flight", "#66BB6A"),
    ("Dîner", "restaurant", "#FFA726"),
    ("Sport", "directions_run", "#EF5350"),
    ("Deuil", "format_color_reset", "#78909C"),
];

pub fn seed_event_types(conn: &Connection) -> Result<()> {
    for (name, icon, color) in EVENT_TYPES {
        conn.execute(
            "INSERT INTO event_types (id, name, icon, color) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO NOTHING",
            (Uuid::new_v4().to_string(), name, icon, color),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        seed_event_types(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM event_types", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 9);
    }

    #[test]
    fn migrations_can_run_twice() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();
    }
}
