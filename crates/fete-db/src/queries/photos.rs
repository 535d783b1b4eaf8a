use crate::Database;
use crate::models::{AlbumRow, PhotoCommentRow, PhotoRow};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row};

fn map_album_row(row: &Row) -> rusqlite::Result<AlbumRow> {
    Ok(AlbumRow {
        id: row.get(0)?,
        event_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        cover_image: row.get(4)?,
        created_by: row.get(5)?,
        created_at: row.get(6)?,
        is_public: row.get(7)?,
    })
}

fn map_photo_row(row: &Row) -> rusqlite::Result<PhotoRow> {
    Ok(PhotoRow {
        id: row.get(0)?,
        album_id: row.get(1)?,
        image: row.get(2)?,
        caption: row.get(3)?,
        uploaded_by: row.get(4)?,
        uploaded_at: row.get(5)?,
        location: row.get(6)?,
    })
}

const ALBUM_SELECT: &str = "SELECT a.id, a.event_id, a.name, a.description, a.cover_image,
        a.created_by, a.created_at, a.is_public
     FROM albums a";

const PHOTO_SELECT: &str =
    "SELECT p.id, p.album_id, p.image, p.caption, p.uploaded_by, p.uploaded_at, p.location
     FROM photos p";

impl Database {
    // -- Albums --

    #[allow(clippy::too_many_arguments)]
    pub fn insert_album(
        &self,
        id: &str,
        event_id: &str,
        name: &str,
        description: &str,
        cover_image: Option<&str>,
        created_by: &str,
        created_at: &str,
        is_public: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO albums (id, event_id, name, description, cover_image,
                     created_by, created_at, is_public)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                (id, event_id, name, description, cover_image, created_by, created_at, is_public),
            )?;
            Ok(())
        })
    }

    pub fn list_albums(&self, owner: &str) -> Result<Vec<AlbumRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN events e ON a.event_id = e.id WHERE e.created_by = ?1 ORDER BY a.created_at",
                ALBUM_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner], map_album_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_album(&self, owner: &str, id: &str) -> Result<Option<AlbumRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN events e ON a.event_id = e.id WHERE a.id = ?1 AND e.created_by = ?2",
                ALBUM_SELECT
            );
            let row = conn.query_row(&sql, [id, owner], map_album_row).optional()?;
            Ok(row)
        })
    }

    pub fn album_owner(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let owner = conn
                .query_row(
                    "SELECT e.created_by FROM albums a
                     JOIN events e ON a.event_id = e.id WHERE a.id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(owner)
        })
    }

    pub fn update_album(
        &self,
        id: &str,
        name: &str,
        description: &str,
        cover_image: Option<&str>,
        is_public: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE albums SET name = ?2, description = ?3, cover_image = ?4, is_public = ?5
                 WHERE id = ?1",
                (id, name, description, cover_image, is_public),
            )?;
            Ok(())
        })
    }

    /// Destroying an album destroys its photos and their comments.
    pub fn delete_album(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "DELETE FROM photo_comments WHERE photo_id IN
                     (SELECT id FROM photos WHERE album_id = ?1)",
                [id],
            )?;
            tx.execute("DELETE FROM photos WHERE album_id = ?1", [id])?;
            tx.execute("DELETE FROM albums WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Photos --

    pub fn insert_photo(
        &self,
        id: &str,
        album_id: &str,
        image: &str,
        caption: &str,
        uploaded_by: &str,
        uploaded_at: &str,
        location: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO photos (id, album_id, image, caption, uploaded_by, uploaded_at, location)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                (id, album_id, image, caption, uploaded_by, uploaded_at, location),
            )?;
            Ok(())
        })
    }

    pub fn list_photos(&self, owner: &str) -> Result<Vec<PhotoRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN albums a ON p.album_id = a.id
                   JOIN events e ON a.event_id = e.id
                 WHERE e.created_by = ?1 ORDER BY p.uploaded_at",
                PHOTO_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner], map_photo_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_photo(&self, owner: &str, id: &str) -> Result<Option<PhotoRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN albums a ON p.album_id = a.id
                   JOIN events e ON a.event_id = e.id
                 WHERE p.id = ?1 AND e.created_by = ?2",
                PHOTO_SELECT
            );
            let row = conn.query_row(&sql, [id, owner], map_photo_row).optional()?;
            Ok(row)
        })
    }

    pub fn photo_owner(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let owner = conn
                .query_row(
                    "SELECT e.created_by FROM photos p
                     JOIN albums a ON p.album_id = a.id
                     JOIN events e ON a.event_id = e.id
                     WHERE p.id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(owner)
        })
    }

    pub fn delete_photo(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("DELETE FROM photo_comments WHERE photo_id = ?1", [id])?;
            tx.execute("DELETE FROM photos WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Comments --

    pub fn insert_photo_comment(
        &self,
        id: &str,
        photo_id: &str,
        user_id: &str,
        comment: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO photo_comments (id, photo_id, user_id, comment, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, photo_id, user_id, comment, created_at),
            )?;
            Ok(())
        })
    }

    pub fn list_photo_comments(&self, owner: &str, photo_id: &str) -> Result<Vec<PhotoCommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.photo_id, c.user_id, c.comment, c.created_at
                 FROM photo_comments c
                 JOIN photos p ON c.photo_id = p.id
                 JOIN albums a ON p.album_id = a.id
                 JOIN events e ON a.event_id = e.id
                 WHERE c.photo_id = ?1 AND e.created_by = ?2
                 ORDER BY c.created_at",
            )?;
            let rows = stmt
                .query_map([photo_id, owner], |row| {
                    Ok(PhotoCommentRow {
                        id: row.get(0)?,
                        photo_id: row.get(1)?,
                        user_id: row.get(2)?,
                        comment: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn photo_comment_owner(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let owner = conn
                .query_row(
                    "SELECT e.created_by FROM photo_comments c
                     JOIN photos p ON c.photo_id = p.id
                     JOIN albums a ON p.album_id = a.id
                     JOIN events e ON a.event_id = e.id
                     WHERE c.id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(owner)
        })
    }

    pub fn delete_photo_comment(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM photo_comments WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::events::tests::{NOW, mk_event, setup};

    #[test]
    fn album_delete_removes_photos_and_comments() {
        let (db, type_id) = setup();
        mk_event(&db, "e1", "owner", &type_id, "2024-06-10 00:00:00", None);
        db.insert_album("a1", "e1", "album", "", None, "owner", NOW, true).unwrap();
        db.insert_photo("p1", "a1", "photos/p1.jpg", "", "owner", NOW, "").unwrap();
        db.insert_photo_comment("c1", "p1", "owner", "bravo", NOW).unwrap();

        db.delete_album("a1").unwrap();

        assert!(db.get_photo("owner", "p1").unwrap().is_none());
        assert_eq!(db.list_photos("owner").unwrap().len(), 0);
    }

    #[test]
    fn photos_are_scoped_through_album_and_event() {
        let (db, type_id) = setup();
        mk_event(&db, "e1", "owner", &type_id, "2024-06-10 00:00:00", None);
        db.insert_album("a1", "e1", "album", "", None, "owner", NOW, true).unwrap();
        db.insert_photo("p1", "a1", "photos/p1.jpg", "", "owner", NOW, "").unwrap();

        assert!(db.get_photo("other", "p1").unwrap().is_none());
        assert_eq!(db.photo_owner("p1").unwrap().as_deref(), Some("owner"));
        assert_eq!(db.album_owner("a1").unwrap().as_deref(), Some("owner"));
    }
}
