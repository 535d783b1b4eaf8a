use crate::Database;
use crate::models::{TaskCategoryRow, TaskRow, VendorRow};
use anyhow::Result;
use fete_types::models::{TaskPriority, TaskStatus};
use rusqlite::{OptionalExtension, Row};

const TASK_SELECT: &str = "SELECT t.id, t.event_id, t.category_id, t.title, t.description,
        t.status, t.priority, t.due_date, t.assigned_to, t.created_by, t.created_at, t.completed_at
     FROM tasks t";

fn map_task_row(row: &Row) -> rusqlite::Result<TaskRow> {
    let status: String = row.get(5)?;
    let priority: String = row.get(6)?;
    Ok(TaskRow {
        id: row.get(0)?,
        event_id: row.get(1)?,
        category_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        status: TaskStatus::parse(&status).unwrap_or(TaskStatus::NotStarted),
        priority: TaskPriority::parse(&priority).unwrap_or(TaskPriority::Medium),
        due_date: row.get(7)?,
        assigned_to: row.get(8)?,
        created_by: row.get(9)?,
        created_at: row.get(10)?,
        completed_at: row.get(11)?,
    })
}

fn map_vendor_row(row: &Row) -> rusqlite::Result<VendorRow> {
    Ok(VendorRow {
        id: row.get(0)?,
        event_id: row.get(1)?,
        name: row.get(2)?,
        service_type: row.get(3)?,
        contact_name: row.get(4)?,
        contact_email: row.get(5)?,
        contact_phone: row.get(6)?,
        website: row.get(7)?,
        notes: row.get(8)?,
    })
}

const VENDOR_SELECT: &str = "SELECT v.id, v.event_id, v.name, v.service_type, v.contact_name,
        v.contact_email, v.contact_phone, v.website, v.notes
     FROM vendors v";

pub struct NewTask<'a> {
    pub id: &'a str,
    pub event_id: &'a str,
    pub category_id: Option<&'a str>,
    pub title: &'a str,
    pub description: &'a str,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<&'a str>,
    pub assigned_to: Option<&'a str>,
    pub created_by: &'a str,
    pub created_at: &'a str,
}

pub struct TaskUpdate<'a> {
    pub category_id: Option<&'a str>,
    pub title: &'a str,
    pub description: &'a str,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<&'a str>,
    pub assigned_to: Option<&'a str>,
    pub completed_at: Option<&'a str>,
}

pub struct NewVendor<'a> {
    pub id: &'a str,
    pub event_id: &'a str,
    pub name: &'a str,
    pub service_type: &'a str,
    pub contact_name: &'a str,
    pub contact_email: &'a str,
    pub contact_phone: &'a str,
    pub website: &'a str,
    pub notes: &'a str,
}

impl Database {
    // -- Task categories --

    pub fn insert_task_category(&self, id: &str, event_id: &str, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO task_categories (id, event_id, name) VALUES (?1, ?2, ?3)",
                (id, event_id, name),
            )?;
            Ok(())
        })
    }

    pub fn list_task_categories(&self, owner: &str) -> Result<Vec<TaskCategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.event_id, c.name FROM task_categories c
                 JOIN events e ON c.event_id = e.id WHERE e.created_by = ?1 ORDER BY c.name",
            )?;
            let rows = stmt
                .query_map([owner], |row| {
                    Ok(TaskCategoryRow {
                        id: row.get(0)?,
                        event_id: row.get(1)?,
                        name: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_task_category(&self, owner: &str, id: &str) -> Result<Option<TaskCategoryRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT c.id, c.event_id, c.name FROM task_categories c
                     JOIN events e ON c.event_id = e.id WHERE c.id = ?1 AND e.created_by = ?2",
                    [id, owner],
                    |row| {
                        Ok(TaskCategoryRow {
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

    pub fn delete_task_category(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("UPDATE tasks SET category_id = NULL WHERE category_id = ?1", [id])?;
            tx.execute("DELETE FROM task_categories WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Tasks --

    pub fn insert_task(&self, task: &NewTask) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, event_id, category_id, title, description, status,
                     priority, due_date, assigned_to, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                (
                    task.id,
                    task.event_id,
                    task.category_id,
                    task.title,
                    task.description,
                    task.status.as_str(),
                    task.priority.as_str(),
                    task.due_date,
                    task.assigned_to,
                    task.created_by,
                    task.created_at,
                ),
            )?;
            Ok(())
        })
    }

    pub fn list_tasks(&self, owner: &str) -> Result<Vec<TaskRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN events e ON t.event_id = e.id WHERE e.created_by = ?1 ORDER BY t.created_at",
                TASK_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner], map_task_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_tasks_for_event(&self, event_id: &str) -> Result<Vec<TaskRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE t.event_id = ?1 ORDER BY t.created_at", TASK_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([event_id], map_task_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_task(&self, owner: &str, id: &str) -> Result<Option<TaskRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN events e ON t.event_id = e.id WHERE t.id = ?1 AND e.created_by = ?2",
                TASK_SELECT
            );
            let row = conn.query_row(&sql, [id, owner], map_task_row).optional()?;
            Ok(row)
        })
    }

    pub fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tasks SET category_id = ?2, title = ?3, description = ?4, status = ?5,
                     priority = ?6, due_date = ?7, assigned_to = ?8, completed_at = ?9
                 WHERE id = ?1",
                (
                    id,
                    update.category_id,
                    update.title,
                    update.description,
                    update.status.as_str(),
                    update.priority.as_str(),
                    update.due_date,
                    update.assigned_to,
                    update.completed_at,
                ),
            )?;
            Ok(())
        })
    }

    pub fn delete_task(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Vendors --

    pub fn insert_vendor(&self, vendor: &NewVendor) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO vendors (id, event_id, name, service_type, contact_name,
                     contact_email, contact_phone, website, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                (
                    vendor.id,
                    vendor.event_id,
                    vendor.name,
                    vendor.service_type,
                    vendor.contact_name,
                    vendor.contact_email,
                    vendor.contact_phone,
                    vendor.website,
                    vendor.notes,
                ),
            )?;
            Ok(())
        })
    }

    pub fn list_vendors(&self, owner: &str) -> Result<Vec<VendorRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN events e ON v.event_id = e.id WHERE e.created_by = ?1 ORDER BY v.name",
                VENDOR_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner], map_vendor_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_vendor(&self, owner: &str, id: &str) -> Result<Option<VendorRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN events e ON v.event_id = e.id WHERE v.id = ?1 AND e.created_by = ?2",
                VENDOR_SELECT
            );
            let row = conn.query_row(&sql, [id, owner], map_vendor_row).optional()?;
            Ok(row)
        })
    }

    pub fn update_vendor(&self, id: &str, vendor: &NewVendor) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE vendors SET name = ?2, service_type = ?3, contact_name = ?4,
                     contact_email = ?5, contact_phone = ?6, website = ?7, notes = ?8
                 WHERE id = ?1",
                (
                    id,
                    vendor.name,
                    vendor.service_type,
                    vendor.contact_name,
                    vendor.contact_email,
                    vendor.contact_phone,
                    vendor.website,
                    vendor.notes,
                ),
            )?;
            Ok(())
        })
    }

    pub fn delete_vendor(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM vendors WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::events::tests::{NOW, mk_event, setup};

    #[test]
    fn deleting_a_category_detaches_its_tasks() {
        let (db, type_id) = setup();
        mk_event(&db, "e1", "owner", &type_id, "2024-06-10 00:00:00", None);
        db.insert_task_category("c1", "e1", "logistique").unwrap();
        db.insert_task(&NewTask {
            id: "t1",
            event_id: "e1",
            category_id: Some("c1"),
            title: "louer des chaises",
            description: "",
            status: TaskStatus::NotStarted,
            priority: TaskPriority::High,
            due_date: None,
            assigned_to: None,
            created_by: "owner",
            created_at: NOW,
        })
        .unwrap();

        db.delete_task_category("c1").unwrap();

        let task = db.get_task("owner", "t1").unwrap().unwrap();
        assert_eq!(task.category_id, None);
        assert_eq!(task.priority, TaskPriority::High);
    }

    #[test]
    fn task_queries_are_owner_scoped() {
        let (db, type_id) = setup();
        mk_event(&db, "e1", "owner", &type_id, "2024-06-10 00:00:00", None);
        db.insert_task(&NewTask {
            id: "t1",
            event_id: "e1",
            category_id: None,
            title: "t",
            description: "",
            status: TaskStatus::InProgress,
            priority: TaskPriority::Low,
            due_date: None,
            assigned_to: None,
            created_by: "owner",
            created_at: NOW,
        })
        .unwrap();

        assert_eq!(db.list_tasks("owner").unwrap().len(), 1);
        assert_eq!(db.list_tasks("other").unwrap().len(), 0);
        assert!(db.get_task("other", "t1").unwrap().is_none());
    }
}
