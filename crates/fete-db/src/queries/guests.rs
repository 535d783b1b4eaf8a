use crate::Database;
use crate::models::{GuestGroupRow, GuestRow, InvitationRow};
use anyhow::Result;
use fete_types::models::ResponseStatus;
use rusqlite::{OptionalExtension, Row};

const GUEST_SELECT: &str = "SELECT g.id, g.event_id, g.group_id, g.user_id, g.name, g.email,
        g.phone, g.response_status, g.plus_ones, g.note, g.invited_at, g.responded_at
     FROM guests g";

fn map_guest_row(row: &Row) -> rusqlite::Result<GuestRow> {
    let status: String = row.get(7)?;
    Ok(GuestRow {
        id: row.get(0)?,
        event_id: row.get(1)?,
        group_id: row.get(2)?,
        user_id: row.get(3)?,
        name: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
        response_status: ResponseStatus::parse(&status).unwrap_or(ResponseStatus::Pending),
        plus_ones: row.get(8)?,
        note: row.get(9)?,
        invited_at: row.get(10)?,
        responded_at: row.get(11)?,
    })
}

pub struct NewGuest<'a> {
    pub id: &'a str,
    pub event_id: &'a str,
    pub group_id: Option<&'a str>,
    pub user_id: Option<&'a str>,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub plus_ones: u32,
    pub note: &'a str,
    pub invited_at: &'a str,
}

pub struct GuestUpdate<'a> {
    pub group_id: Option<&'a str>,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub response_status: ResponseStatus,
    pub plus_ones: u32,
    pub note: &'a str,
    pub responded_at: Option<&'a str>,
}

impl Database {
    // -- Guest groups --

    pub fn insert_guest_group(&self, id: &str, event_id: &str, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO guest_groups (id, event_id, name) VALUES (?1, ?2, ?3)",
                (id, event_id, name),
            )?;
            Ok(())
        })
    }

    pub fn list_guest_groups(&self, owner: &str) -> Result<Vec<GuestGroupRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT g.id, g.event_id, g.name FROM guest_groups g
                 JOIN events e ON g.event_id = e.id WHERE e.created_by = ?1 ORDER BY g.name",
            )?;
            let rows = stmt
                .query_map([owner], |row| {
                    Ok(GuestGroupRow {
                        id: row.get(0)?,
                        event_id: row.get(1)?,
                        name: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_guest_group(&self, owner: &str, id: &str) -> Result<Option<GuestGroupRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT g.id, g.event_id, g.name FROM guest_groups g
                     JOIN events e ON g.event_id = e.id WHERE g.id = ?1 AND e.created_by = ?2",
                    [id, owner],
                    |row| {
                        Ok(GuestGroupRow {
                            id: row.get(0)?,
                            event_id: row.get(1)?,
                            name: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_guest_group(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            // Members of a deleted group stay on the event, ungrouped
            tx.execute("UPDATE guests SET group_id = NULL WHERE group_id = ?1", [id])?;
            tx.execute("DELETE FROM guest_groups WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Guests --

    pub fn insert_guest(&self, guest: &NewGuest) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO guests (id, event_id, group_id, user_id, name, email, phone,
                     plus_ones, note, invited_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                (
                    guest.id,
                    guest.event_id,
                    guest.group_id,
                    guest.user_id,
                    guest.name,
                    guest.email,
                    guest.phone,
                    guest.plus_ones,
                    guest.note,
                    guest.invited_at,
                ),
            )?;
            Ok(())
        })
    }

    pub fn list_guests(&self, owner: &str) -> Result<Vec<GuestRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN events e ON g.event_id = e.id WHERE e.created_by = ?1 ORDER BY g.invited_at",
                GUEST_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner], map_guest_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_guests_for_event(&self, event_id: &str) -> Result<Vec<GuestRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE g.event_id = ?1 ORDER BY g.invited_at", GUEST_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([event_id], map_guest_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_guest(&self, owner: &str, id: &str) -> Result<Option<GuestRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN events e ON g.event_id = e.id WHERE g.id = ?1 AND e.created_by = ?2",
                GUEST_SELECT
            );
            let row = conn.query_row(&sql, [id, owner], map_guest_row).optional()?;
            Ok(row)
        })
    }

    /// Owner of the event a guest belongs to, unscoped.
    pub fn guest_owner(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let owner = conn
                .query_row(
                    "SELECT e.created_by FROM guests g
                     JOIN events e ON g.event_id = e.id WHERE g.id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(owner)
        })
    }

    pub fn update_guest(&self, id: &str, update: &GuestUpdate) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE guests SET group_id = ?2, name = ?3, email = ?4, phone = ?5,
                     response_status = ?6, plus_ones = ?7, note = ?8, responded_at = ?9
                 WHERE id = ?1",
                (
                    id,
                    update.group_id,
                    update.name,
                    update.email,
                    update.phone,
                    update.response_status.as_str(),
                    update.plus_ones,
                    update.note,
                    update.responded_at,
                ),
            )?;
            Ok(())
        })
    }

    pub fn delete_guest(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("DELETE FROM invitations WHERE guest_id = ?1", [id])?;
            tx.execute("DELETE FROM guests WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Invitations --

    pub fn insert_invitation(
        &self,
        id: &str,
        guest_id: &str,
        message: &str,
        sent_at: &str,
        unique_code: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO invitations (id, guest_id, message, sent_at, unique_code)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, guest_id, message, sent_at, unique_code),
            )?;
            Ok(())
        })
    }

    pub fn list_invitations(&self, owner: &str) -> Result<Vec<InvitationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT i.id, i.guest_id, i.message, i.sent_at, i.viewed_at, i.unique_code
                 FROM invitations i
                 JOIN guests g ON i.guest_id = g.id
                 JOIN events e ON g.event_id = e.id
                 WHERE e.created_by = ?1 ORDER BY i.sent_at",
            )?;
            let rows = stmt
                .query_map([owner], |row| {
                    Ok(InvitationRow {
                        id: row.get(0)?,
                        guest_id: row.get(1)?,
                        message: row.get(2)?,
                        sent_at: row.get(3)?,
                        viewed_at: row.get(4)?,
                        unique_code: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::events::tests::{NOW, mk_event, setup};

    fn mk_guest(db: &crate::Database, id: &str, event_id: &str, group_id: Option<&str>) {
        db.insert_guest(&NewGuest {
            id,
            event_id,
            group_id,
            user_id: None,
            name: "Claire",
            email: "",
            phone: "",
            plus_ones: 0,
            note: "",
            invited_at: NOW,
        })
        .unwrap();
    }

    #[test]
    fn deleting_a_group_ungroups_its_guests() {
        let (db, type_id) = setup();
        mk_event(&db, "e1", "owner", &type_id, "2024-06-10 00:00:00", None);
        db.insert_guest_group("gg1", "e1", "famille").unwrap();
        mk_guest(&db, "g1", "e1", Some("gg1"));

        db.delete_guest_group("gg1").unwrap();

        let guest = db.get_guest("owner", "g1").unwrap().unwrap();
        assert_eq!(guest.group_id, None);
    }

    #[test]
    fn guest_queries_are_owner_scoped() {
        let (db, type_id) = setup();
        mk_event(&db, "e1", "owner", &type_id, "2024-06-10 00:00:00", None);
        mk_guest(&db, "g1", "e1", None);

        assert_eq!(db.list_guests("owner").unwrap().len(), 1);
        assert_eq!(db.list_guests("other").unwrap().len(), 0);
        assert!(db.get_guest("other", "g1").unwrap().is_none());
        assert_eq!(db.guest_owner("g1").unwrap().as_deref(), Some("owner"));
    }
}
