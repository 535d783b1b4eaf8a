use crate::Database;
use crate::models::{GroupMemberRow, MessageGroupRow, MessageRow, ReadReceiptRow};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row};

fn map_group_row(row: &Row) -> rusqlite::Result<MessageGroupRow> {
    Ok(MessageGroupRow {
        id: row.get(0)?,
        event_id: row.get(1)?,
        name: row.get(2)?,
        created_by: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_member_row(row: &Row) -> rusqlite::Result<GroupMemberRow> {
    Ok(GroupMemberRow {
        id: row.get(0)?,
        group_id: row.get(1)?,
        user_id: row.get(2)?,
        joined_at: row.get(3)?,
        is_admin: row.get(4)?,
    })
}

impl Database {
    // -- Message groups --

    pub fn insert_message_group(
        &self,
        id: &str,
        event_id: &str,
        name: &str,
        created_by: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO message_groups (id, event_id, name, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, event_id, name, created_by, created_at),
            )?;
            Ok(())
        })
    }

    pub fn list_message_groups(&self, owner: &str) -> Result<Vec<MessageGroupRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT g.id, g.event_id, g.name, g.created_by, g.created_at FROM message_groups g
                 JOIN events e ON g.event_id = e.id WHERE e.created_by = ?1 ORDER BY g.created_at",
            )?;
            let rows = stmt
                .query_map([owner], map_group_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_message_group(&self, owner: &str, id: &str) -> Result<Option<MessageGroupRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT g.id, g.event_id, g.name, g.created_by, g.created_at FROM message_groups g
                     JOIN events e ON g.event_id = e.id WHERE g.id = ?1 AND e.created_by = ?2",
                    [id, owner],
                    map_group_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn message_group_owner(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let owner = conn
                .query_row(
                    "SELECT e.created_by FROM message_groups g
                     JOIN events e ON g.event_id = e.id WHERE g.id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(owner)
        })
    }

    pub fn delete_message_group(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "DELETE FROM read_receipts WHERE message_id IN
                     (SELECT id FROM messages WHERE group_id = ?1)",
                [id],
            )?;
            tx.execute("DELETE FROM messages WHERE group_id = ?1", [id])?;
            tx.execute("DELETE FROM message_group_members WHERE group_id = ?1", [id])?;
            tx.execute("DELETE FROM message_groups WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Members --

    pub fn insert_group_member(
        &self,
        id: &str,
        group_id: &str,
        user_id: &str,
        joined_at: &str,
        is_admin: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO message_group_members (id, group_id, user_id, joined_at, is_admin)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, group_id, user_id, joined_at, is_admin),
            )?;
            Ok(())
        })
    }

    pub fn group_member_exists(&self, group_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM message_group_members WHERE group_id = ?1 AND user_id = ?2",
                    [group_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn list_group_members(&self, owner: &str, group_id: &str) -> Result<Vec<GroupMemberRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.group_id, m.user_id, m.joined_at, m.is_admin
                 FROM message_group_members m
                 JOIN message_groups g ON m.group_id = g.id
                 JOIN events e ON g.event_id = e.id
                 WHERE m.group_id = ?1 AND e.created_by = ?2
                 ORDER BY m.joined_at",
            )?;
            let rows = stmt
                .query_map([group_id, owner], map_member_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_group_member(&self, owner: &str, id: &str) -> Result<Option<GroupMemberRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT m.id, m.group_id, m.user_id, m.joined_at, m.is_admin
                     FROM message_group_members m
                     JOIN message_groups g ON m.group_id = g.id
                     JOIN events e ON g.event_id = e.id
                     WHERE m.id = ?1 AND e.created_by = ?2",
                    [id, owner],
                    map_member_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_group_member(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM message_group_members WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        group_id: &str,
        sender_id: &str,
        content: &str,
        sent_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, group_id, sender_id, content, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, group_id, sender_id, content, sent_at),
            )?;
            Ok(())
        })
    }

    pub fn list_messages(&self, owner: &str, group_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.group_id, m.sender_id, m.content, m.sent_at FROM messages m
                 JOIN message_groups g ON m.group_id = g.id
                 JOIN events e ON g.event_id = e.id
                 WHERE m.group_id = ?1 AND e.created_by = ?2
                 ORDER BY m.sent_at",
            )?;
            let rows = stmt
                .query_map([group_id, owner], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        group_id: row.get(1)?,
                        sender_id: row.get(2)?,
                        content: row.get(3)?,
                        sent_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn message_owner(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let owner = conn
                .query_row(
                    "SELECT e.created_by FROM messages m
                     JOIN message_groups g ON m.group_id = g.id
                     JOIN events e ON g.event_id = e.id
                     WHERE m.id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(owner)
        })
    }

    // -- Read receipts --

    pub fn insert_read_receipt(
        &self,
        id: &str,
        message_id: &str,
        user_id: &str,
        read_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO read_receipts (id, message_id, user_id, read_at)
                 VALUES (?1, ?2, ?3, ?4)",
                (id, message_id, user_id, read_at),
            )?;
            Ok(())
        })
    }

    pub fn read_receipt_exists(&self, message_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM read_receipts WHERE message_id = ?1 AND user_id = ?2",
                    [message_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn list_read_receipts(&self, owner: &str, message_id: &str) -> Result<Vec<ReadReceiptRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.message_id, r.user_id, r.read_at FROM read_receipts r
                 JOIN messages m ON r.message_id = m.id
                 JOIN message_groups g ON m.group_id = g.id
                 JOIN events e ON g.event_id = e.id
                 WHERE r.message_id = ?1 AND e.created_by = ?2
                 ORDER BY r.read_at",
            )?;
            let rows = stmt
                .query_map([message_id, owner], |row| {
                    Ok(ReadReceiptRow {
                        id: row.get(0)?,
                        message_id: row.get(1)?,
                        user_id: row.get(2)?,
                        read_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
