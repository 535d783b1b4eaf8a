use crate::Database;
use crate::models::{GiftListRow, GiftRow};
use anyhow::Result;
use fete_types::models::GiftStatus;
use rusqlite::{OptionalExtension, Row};

const GIFT_SELECT: &str = "SELECT g.id, g.list_id, g.name, g.description, g.price, g.url,
        g.image, g.status, g.reserved_by, g.created_at
     FROM gifts g";

fn map_gift_row(row: &Row) -> rusqlite::Result<GiftRow> {
    let status: String = row.get(7)?;
    Ok(GiftRow {
        id: row.get(0)?,
        list_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        url: row.get(5)?,
        image: row.get(6)?,
        status: GiftStatus::parse(&status).unwrap_or(GiftStatus::Available),
        reserved_by: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn map_gift_list_row(row: &Row) -> rusqlite::Result<GiftListRow> {
    Ok(GiftListRow {
        id: row.get(0)?,
        event_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub struct NewGift<'a> {
    pub id: &'a str,
    pub list_id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub price: Option<f64>,
    pub url: &'a str,
    pub image: Option<&'a str>,
    pub created_at: &'a str,
}

pub struct GiftUpdate<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub price: Option<f64>,
    pub url: &'a str,
    pub image: Option<&'a str>,
    pub status: GiftStatus,
    pub reserved_by: Option<&'a str>,
}

impl Database {
    // -- Gift lists --

    pub fn insert_gift_list(
        &self,
        id: &str,
        event_id: &str,
        name: &str,
        description: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO gift_lists (id, event_id, name, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, event_id, name, description, created_at),
            )?;
            Ok(())
        })
    }

    pub fn list_gift_lists(&self, owner: &str) -> Result<Vec<GiftListRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT l.id, l.event_id, l.name, l.description, l.created_at FROM gift_lists l
                 JOIN events e ON l.event_id = e.id WHERE e.created_by = ?1 ORDER BY l.created_at",
            )?;
            let rows = stmt
                .query_map([owner], map_gift_list_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_gift_list(&self, owner: &str, id: &str) -> Result<Option<GiftListRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT l.id, l.event_id, l.name, l.description, l.created_at FROM gift_lists l
                     JOIN events e ON l.event_id = e.id WHERE l.id = ?1 AND e.created_by = ?2",
                    [id, owner],
                    map_gift_list_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// The 1:1 list attached to an event, if any.
    pub fn gift_list_for_event(&self, event_id: &str) -> Result<Option<GiftListRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, event_id, name, description, created_at FROM gift_lists
                     WHERE event_id = ?1",
                    [event_id],
                    map_gift_list_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn gift_list_owner(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let owner = conn
                .query_row(
                    "SELECT e.created_by FROM gift_lists l
                     JOIN events e ON l.event_id = e.id WHERE l.id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(owner)
        })
    }

    pub fn delete_gift_list(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("DELETE FROM gifts WHERE list_id = ?1", [id])?;
            tx.execute("DELETE FROM gift_lists WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Gifts --

    pub fn insert_gift(&self, gift: &NewGift) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO gifts (id, list_id, name, description, price, url, image, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                (
                    gift.id,
                    gift.list_id,
                    gift.name,
                    gift.description,
                    gift.price,
                    gift.url,
                    gift.image,
                    gift.created_at,
                ),
            )?;
            Ok(())
        })
    }

    pub fn list_gifts(&self, owner: &str) -> Result<Vec<GiftRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN gift_lists l ON g.list_id = l.id
                   JOIN events e ON l.event_id = e.id
                 WHERE e.created_by = ?1 ORDER BY g.created_at",
                GIFT_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner], map_gift_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_gift(&self, owner: &str, id: &str) -> Result<Option<GiftRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN gift_lists l ON g.list_id = l.id
                   JOIN events e ON l.event_id = e.id
                 WHERE g.id = ?1 AND e.created_by = ?2",
                GIFT_SELECT
            );
            let row = conn.query_row(&sql, [id, owner], map_gift_row).optional()?;
            Ok(row)
        })
    }

    pub fn update_gift(&self, id: &str, update: &GiftUpdate) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE gifts SET name = ?2, description = ?3, price = ?4, url = ?5, image = ?6,
                     status = ?7, reserved_by = ?8
                 WHERE id = ?1",
                (
                    id,
                    update.name,
                    update.description,
                    update.price,
                    update.url,
                    update.image,
                    update.status.as_str(),
                    update.reserved_by,
                ),
            )?;
            Ok(())
        })
    }

    pub fn delete_gift(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM gifts WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}
