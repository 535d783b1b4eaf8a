use crate::Database;
use crate::models::{EventRow, EventTypeRow};
use anyhow::Result;
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row};

const EVENT_SELECT: &str = "SELECT e.id, e.title, e.event_type_id, t.name, t.color,
        e.description, e.location, e.start_date, e.end_date,
        e.created_by, e.created_at, e.updated_at, e.is_private
     FROM events e
     JOIN event_types t ON e.event_type_id = t.id";

/// Ordering override accepted by the event listing. Django-style spelling:
/// a leading `-` means descending. Anything else falls back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrdering {
    StartDateDesc,
    StartDateAsc,
    CreatedAtDesc,
    CreatedAtAsc,
}

impl EventOrdering {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start_date" => Some(Self::StartDateAsc),
            "-start_date" => Some(Self::StartDateDesc),
            "created_at" => Some(Self::CreatedAtAsc),
            "-created_at" => Some(Self::CreatedAtDesc),
            _ => None,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::StartDateDesc => "e.start_date DESC",
            Self::StartDateAsc => "e.start_date ASC",
            Self::CreatedAtDesc => "e.created_at DESC",
            Self::CreatedAtAsc => "e.created_at ASC",
        }
    }
}

/// Filters for the owner-scoped event listing. The owner filter itself is a
/// separate mandatory argument: no combination of these can widen the set
/// beyond the caller's own events.
#[derive(Debug, Default)]
pub struct EventFilter {
    pub event_type: Option<String>,
    pub start_date: Option<String>,
    pub is_private: Option<bool>,
    pub search: Option<String>,
    pub ordering: Option<EventOrdering>,
}

pub struct NewEvent<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub event_type_id: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub start_date: &'a str,
    pub end_date: Option<&'a str>,
    pub created_by: &'a str,
    pub now: &'a str,
    pub is_private: bool,
}

pub struct EventUpdate<'a> {
    pub title: &'a str,
    pub event_type_id: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub start_date: &'a str,
    pub end_date: Option<&'a str>,
    pub is_private: bool,
    pub updated_at: &'a str,
}

/// Half-open window `[first of month, first of next month)`, with the
/// December rollover into the next year handled explicitly.
pub fn month_window(year: i32, month: u32) -> (String, String) {
    let start = format!("{:04}-{:02}-01 00:00:00", year, month);
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = format!("{:04}-{:02}-01 00:00:00", next_year, next_month);
    (start, end)
}

impl Database {
    // -- Event types --

    pub fn list_event_types(&self) -> Result<Vec<EventTypeRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, icon, color FROM event_types ORDER BY name")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(EventTypeRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        icon: row.get(2)?,
                        color: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn event_type_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM event_types WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Events --

    pub fn insert_event(&self, event: &NewEvent) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (id, title, event_type_id, description, location,
                     start_date, end_date, created_by, created_at, updated_at, is_private)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, ?10)",
                (
                    event.id,
                    event.title,
                    event.event_type_id,
                    event.description,
                    event.location,
                    event.start_date,
                    event.end_date,
                    event.created_by,
                    event.now,
                    event.is_private,
                ),
            )?;
            Ok(())
        })
    }

    /// Owner-scoped lookup: a foreign event is indistinguishable from a
    /// missing one.
    pub fn get_event(&self, owner: &str, id: &str) -> Result<Option<EventRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE e.id = ?1 AND e.created_by = ?2", EVENT_SELECT);
            let row = conn
                .query_row(&sql, [id, owner], map_event_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Unscoped owner resolution, used by the access engine to decide between
    /// NotFound and AccessDenied when a nested create references an event.
    pub fn event_owner(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let owner = conn
                .query_row("SELECT created_by FROM events WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(owner)
        })
    }

    pub fn list_events(&self, owner: &str, filter: &EventFilter) -> Result<Vec<EventRow>> {
        self.with_conn(|conn| {
            let mut sql = format!("{} WHERE e.created_by = ?", EVENT_SELECT);
            let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(owner.to_string())];

            if let Some(event_type) = &filter.event_type {
                sql.push_str(" AND e.event_type_id = ?");
                params.push(Box::new(event_type.clone()));
            }
            if let Some(start_date) = &filter.start_date {
                sql.push_str(" AND e.start_date = ?");
                params.push(Box::new(start_date.clone()));
            }
            if let Some(is_private) = filter.is_private {
                sql.push_str(" AND e.is_private = ?");
                params.push(Box::new(is_private));
            }
            if let Some(search) = &filter.search {
                sql.push_str(
                    " AND (LOWER(e.title) LIKE ? OR LOWER(e.description) LIKE ? OR LOWER(e.location) LIKE ?)",
                );
                let pattern = format!("%{}%", search.to_lowercase());
                for _ in 0..3 {
                    params.push(Box::new(pattern.clone()));
                }
            }

            let ordering = filter.ordering.unwrap_or(EventOrdering::StartDateDesc);
            sql.push_str(&format!(" ORDER BY {}", ordering.sql()));

            query_events(conn, &sql, &params)
        })
    }

    /// Events whose start date is at or after `now` (inclusive bound).
    pub fn upcoming_events(&self, owner: &str, now: &str) -> Result<Vec<EventRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE e.created_by = ? AND e.start_date >= ? ORDER BY e.start_date DESC",
                EVENT_SELECT
            );
            let params: Vec<Box<dyn ToSql>> =
                vec![Box::new(owner.to_string()), Box::new(now.to_string())];
            query_events(conn, &sql, &params)
        })
    }

    /// An event belongs to the month when its start date OR its end date
    /// falls inside the window — two independent range tests, not a single
    /// `[start, end]` overlap test. Events without an end date only match
    /// via the start clause.
    pub fn events_by_month(&self, owner: &str, year: i32, month: u32) -> Result<Vec<EventRow>> {
        let (from, to) = month_window(year, month);
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE e.created_by = ?
                    AND ((e.start_date >= ? AND e.start_date < ?)
                      OR (e.end_date IS NOT NULL AND e.end_date >= ? AND e.end_date < ?))
                    ORDER BY e.start_date DESC",
                EVENT_SELECT
            );
            let params: Vec<Box<dyn ToSql>> = vec![
                Box::new(owner.to_string()),
                Box::new(from.clone()),
                Box::new(to.clone()),
                Box::new(from.clone()),
                Box::new(to.clone()),
            ];
            query_events(conn, &sql, &params)
        })
    }

    pub fn update_event(&self, id: &str, update: &EventUpdate) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE events SET title = ?2, event_type_id = ?3, description = ?4, location = ?5,
                     start_date = ?6, end_date = ?7, is_private = ?8, updated_at = ?9
                 WHERE id = ?1",
                (
                    id,
                    update.title,
                    update.event_type_id,
                    update.description,
                    update.location,
                    update.start_date,
                    update.end_date,
                    update.is_private,
                    update.updated_at,
                ),
            )?;
            Ok(())
        })
    }

    /// Explicit cascade: walks the ownership tree top-down inside one
    /// transaction, leaf tables first so foreign keys never dangle.
    pub fn delete_event(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            tx.execute(
                "DELETE FROM read_receipts WHERE message_id IN
                     (SELECT m.id FROM messages m
                      JOIN message_groups g ON m.group_id = g.id
                      WHERE g.event_id = ?1)",
                [id],
            )?;
            tx.execute(
                "DELETE FROM messages WHERE group_id IN
                     (SELECT id FROM message_groups WHERE event_id = ?1)",
                [id],
            )?;
            tx.execute(
                "DELETE FROM message_group_members WHERE group_id IN
                     (SELECT id FROM message_groups WHERE event_id = ?1)",
                [id],
            )?;
            tx.execute("DELETE FROM message_groups WHERE event_id = ?1", [id])?;

            tx.execute(
                "DELETE FROM photo_comments WHERE photo_id IN
                     (SELECT p.id FROM photos p
                      JOIN albums a ON p.album_id = a.id
                      WHERE a.event_id = ?1)",
                [id],
            )?;
            tx.execute(
                "DELETE FROM photos WHERE album_id IN
                     (SELECT id FROM albums WHERE event_id = ?1)",
                [id],
            )?;
            tx.execute("DELETE FROM albums WHERE event_id = ?1", [id])?;

            tx.execute(
                "DELETE FROM gifts WHERE list_id IN
                     (SELECT id FROM gift_lists WHERE event_id = ?1)",
                [id],
            )?;
            tx.execute("DELETE FROM gift_lists WHERE event_id = ?1", [id])?;

            tx.execute(
                "DELETE FROM invitations WHERE guest_id IN
                     (SELECT id FROM guests WHERE event_id = ?1)",
                [id],
            )?;
            tx.execute("DELETE FROM guests WHERE event_id = ?1", [id])?;
            tx.execute("DELETE FROM guest_groups WHERE event_id = ?1", [id])?;

            tx.execute("DELETE FROM tasks WHERE event_id = ?1", [id])?;
            tx.execute("DELETE FROM task_categories WHERE event_id = ?1", [id])?;
            tx.execute("DELETE FROM vendors WHERE event_id = ?1", [id])?;

            tx.execute("DELETE FROM reminders WHERE event_id = ?1", [id])?;

            tx.execute("DELETE FROM events WHERE id = ?1", [id])?;

            tx.commit()?;
            Ok(())
        })
    }
}

fn map_event_row(row: &Row) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        title: row.get(1)?,
        event_type_id: row.get(2)?,
        event_type_name: row.get(3)?,
        event_type_color: row.get(4)?,
        description: row.get(5)?,
        location: row.get(6)?,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
        created_by: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        is_private: row.get(12)?,
    })
}

fn query_events(conn: &Connection, sql: &str, params: &[Box<dyn ToSql>]) -> Result<Vec<EventRow>> {
    let mut stmt = conn.prepare(sql)?;
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), map_event_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::Database;

    pub(crate) const NOW: &str = "2024-06-01 12:00:00";

    pub(crate) fn setup() -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let type_id = db.list_event_types().unwrap()[0].id.clone();
        db.create_user("owner", "alice", "alice@example.com", "h", "", "", NOW)
            .unwrap();
        db.create_user("other", "bob", "bob@example.com", "h", "", "", NOW)
            .unwrap();
        (db, type_id)
    }

    pub(crate) fn mk_event(
        db: &Database,
        id: &str,
        owner: &str,
        type_id: &str,
        start: &str,
        end: Option<&str>,
    ) {
        db.insert_event(&NewEvent {
            id,
            title: &format!("event {}", id),
            event_type_id: type_id,
            description: "",
            location: "",
            start_date: start,
            end_date: end,
            created_by: owner,
            now: NOW,
            is_private: false,
        })
        .unwrap();
    }

    #[test]
    fn month_window_rolls_over_december() {
        assert_eq!(
            month_window(2023, 12),
            ("2023-12-01 00:00:00".into(), "2024-01-01 00:00:00".into())
        );
        assert_eq!(
            month_window(2024, 1),
            ("2024-01-01 00:00:00".into(), "2024-02-01 00:00:00".into())
        );
    }

    #[test]
    fn by_month_matches_start_or_end_in_window() {
        let (db, type_id) = setup();
        // Starts in January, ends in February
        mk_event(
            &db,
            "e1",
            "owner",
            &type_id,
            "2024-01-15 10:00:00",
            Some("2024-02-10 18:00:00"),
        );

        assert_eq!(db.events_by_month("owner", 2024, 1).unwrap().len(), 1);
        assert_eq!(db.events_by_month("owner", 2024, 2).unwrap().len(), 1);
        assert_eq!(db.events_by_month("owner", 2024, 3).unwrap().len(), 0);
    }

    #[test]
    fn by_month_null_end_matches_only_via_start() {
        let (db, type_id) = setup();
        mk_event(&db, "e1", "owner", &type_id, "2024-03-05 09:00:00", None);

        assert_eq!(db.events_by_month("owner", 2024, 3).unwrap().len(), 1);
        assert_eq!(db.events_by_month("owner", 2024, 2).unwrap().len(), 0);
        assert_eq!(db.events_by_month("owner", 2024, 4).unwrap().len(), 0);
    }

    #[test]
    fn december_events_query_across_year_boundary() {
        let (db, type_id) = setup();
        mk_event(
            &db,
            "e1",
            "owner",
            &type_id,
            "2023-12-20 10:00:00",
            Some("2024-01-02 10:00:00"),
        );

        assert_eq!(db.events_by_month("owner", 2023, 12).unwrap().len(), 1);
        assert_eq!(db.events_by_month("owner", 2024, 1).unwrap().len(), 1);
    }

    #[test]
    fn upcoming_bound_is_inclusive() {
        let (db, type_id) = setup();
        mk_event(&db, "past", "owner", &type_id, "2024-05-31 12:00:00", None);
        mk_event(&db, "at-now", "owner", &type_id, NOW, None);
        mk_event(&db, "future", "owner", &type_id, "2024-07-01 12:00:00", None);

        let upcoming = db.upcoming_events("owner", NOW).unwrap();
        let ids: Vec<&str> = upcoming.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["future", "at-now"]);
    }

    #[test]
    fn default_listing_orders_start_date_descending() {
        let (db, type_id) = setup();
        mk_event(&db, "a", "owner", &type_id, "2024-01-01 00:00:00", None);
        mk_event(&db, "b", "owner", &type_id, "2024-03-01 00:00:00", None);
        mk_event(&db, "c", "owner", &type_id, "2024-02-01 00:00:00", None);

        let events = db.list_events("owner", &EventFilter::default()).unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn ordering_override_composes_with_owner_scope() {
        let (db, type_id) = setup();
        mk_event(&db, "a", "owner", &type_id, "2024-01-01 00:00:00", None);
        mk_event(&db, "b", "owner", &type_id, "2024-03-01 00:00:00", None);
        mk_event(&db, "x", "other", &type_id, "2024-02-01 00:00:00", None);

        let filter = EventFilter {
            ordering: Some(EventOrdering::StartDateAsc),
            ..Default::default()
        };
        let events = db.list_events("owner", &filter).unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let (db, type_id) = setup();
        db.insert_event(&NewEvent {
            id: "e1",
            title: "Mariage de Sophie",
            event_type_id: &type_id,
            description: "",
            location: "Paris",
            start_date: "2024-06-10 00:00:00",
            end_date: None,
            created_by: "owner",
            now: NOW,
            is_private: false,
        })
        .unwrap();
        mk_event(&db, "e2", "owner", &type_id, "2024-06-11 00:00:00", None);

        let filter = EventFilter {
            search: Some("SOPHIE".into()),
            ..Default::default()
        };
        assert_eq!(db.list_events("owner", &filter).unwrap().len(), 1);

        let filter = EventFilter {
            search: Some("paris".into()),
            ..Default::default()
        };
        assert_eq!(db.list_events("owner", &filter).unwrap().len(), 1);
    }

    #[test]
    fn listing_never_includes_foreign_events() {
        let (db, type_id) = setup();
        mk_event(&db, "mine", "owner", &type_id, "2024-06-10 00:00:00", None);
        mk_event(&db, "theirs", "other", &type_id, "2024-06-10 00:00:00", None);

        let events = db.list_events("owner", &EventFilter::default()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "mine");

        // A foreign event resolves exactly like a missing one
        assert!(db.get_event("owner", "theirs").unwrap().is_none());
        assert!(db.get_event("owner", "no-such-id").unwrap().is_none());
    }

    #[test]
    fn delete_event_cascades_through_every_nested_table() {
        let (db, type_id) = setup();
        mk_event(&db, "e1", "owner", &type_id, "2024-06-10 00:00:00", None);

        db.insert_reminder("r1", "e1", "2024-06-09 00:00:00", "").unwrap();
        db.insert_guest_group("gg1", "e1", "famille").unwrap();
        db.insert_guest(&crate::queries::guests::NewGuest {
            id: "g1",
            event_id: "e1",
            group_id: Some("gg1"),
            user_id: None,
            name: "Claire",
            email: "",
            phone: "",
            plus_ones: 1,
            note: "",
            invited_at: NOW,
        })
        .unwrap();
        db.insert_invitation("i1", "g1", "bienvenue", NOW, "CODE1").unwrap();
        db.insert_task_category("tc1", "e1", "logistique").unwrap();
        db.insert_task(&crate::queries::planning::NewTask {
            id: "t1",
            event_id: "e1",
            category_id: Some("tc1"),
            title: "réserver la salle",
            description: "",
            status: fete_types::models::TaskStatus::NotStarted,
            priority: fete_types::models::TaskPriority::Medium,
            due_date: None,
            assigned_to: None,
            created_by: "owner",
            created_at: NOW,
        })
        .unwrap();
        db.insert_vendor(&crate::queries::planning::NewVendor {
            id: "v1",
            event_id: "e1",
            name: "Traiteur Dupont",
            service_type: "traiteur",
            contact_name: "",
            contact_email: "",
            contact_phone: "",
            website: "",
            notes: "",
        })
        .unwrap();
        db.insert_gift_list("gl1", "e1", "liste", "", NOW).unwrap();
        db.insert_gift(&crate::queries::gifts::NewGift {
            id: "gift1",
            list_id: "gl1",
            name: "grille-pain",
            description: "",
            price: Some(49.9),
            url: "",
            image: None,
            created_at: NOW,
        })
        .unwrap();
        db.insert_album("a1", "e1", "album", "", None, "owner", NOW, true)
            .unwrap();
        db.insert_photo("p1", "a1", "photos/p1.jpg", "", "owner", NOW, "")
            .unwrap();
        db.insert_photo_comment("pc1", "p1", "owner", "superbe", NOW).unwrap();
        db.insert_message_group("mg1", "e1", "organisation", "owner", NOW)
            .unwrap();
        db.insert_group_member("mm1", "mg1", "owner", NOW, true).unwrap();
        db.insert_message("m1", "mg1", "owner", "on commence", NOW).unwrap();
        db.insert_read_receipt("rr1", "m1", "owner", NOW).unwrap();

        db.delete_event("e1").unwrap();

        let tables = [
            "events",
            "reminders",
            "guest_groups",
            "guests",
            "invitations",
            "task_categories",
            "tasks",
            "vendors",
            "gift_lists",
            "gifts",
            "albums",
            "photos",
            "photo_comments",
            "message_groups",
            "message_group_members",
            "messages",
            "read_receipts",
        ];
        db.with_conn(|conn| {
            for table in tables {
                let count: i64 = conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                        row.get(0)
                    })?;
                assert_eq!(count, 0, "orphan rows left in {}", table);
            }
            Ok(())
        })
        .unwrap();
    }
}
