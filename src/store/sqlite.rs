use super::{BoardSnapshot, BoardStore, BoardTx};
use crate::error::{BoardResult, StoreError, StoreResult};
use crate::model::{
    Assignment, QueueEntry, Resource, ResourceId, WorkItem, WorkItemDraft, WorkItemId,
};
use crate::position::OrderingKey;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};

pub struct SqliteStore {
    connection: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> StoreResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> StoreResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> StoreResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS resources (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS work_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS assignments (
                work_item_id INTEGER PRIMARY KEY
                    REFERENCES work_items(id) ON DELETE CASCADE,
                resource_id INTEGER REFERENCES resources(id),
                ordering_key REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_assignments_queue
                ON assignments(resource_id, ordering_key);
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }
}

impl BoardStore for SqliteStore {
    fn transaction<T, F>(&self, f: F) -> BoardResult<T>
    where
        F: FnOnce(&mut dyn BoardTx) -> BoardResult<T>,
    {
        let mut conn = self.connection.lock();
        let tx = conn.transaction().map_err(StoreError::from)?;
        let mut handle = SqliteTx { conn: &tx };
        // Dropping `tx` without commit rolls back.
        let out = f(&mut handle)?;
        tx.commit().map_err(StoreError::from)?;
        Ok(out)
    }
}

struct SqliteTx<'c> {
    conn: &'c Connection,
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<(WorkItemId, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn decode_item(id: WorkItemId, json: &str) -> StoreResult<WorkItem> {
    let draft: WorkItemDraft = serde_json::from_str(json)?;
    Ok(WorkItem::from_draft(id, draft))
}

fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        work_item_id: row.get(0)?,
        resource_id: row.get(1)?,
        key: OrderingKey::new(row.get(2)?),
    })
}

impl SqliteTx<'_> {
    fn insert_item_with_id(&self, item: &WorkItem) -> StoreResult<()> {
        let json = serde_json::to_string(&item.to_draft())?;
        self.conn.execute(
            "INSERT INTO work_items (id, item_json) VALUES (?1, ?2)",
            params![item.id, json],
        )?;
        Ok(())
    }
}

impl BoardTx for SqliteTx<'_> {
    fn resources(&self) -> StoreResult<Vec<Resource>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM resources ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Resource {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        let mut resources = Vec::new();
        for resource in rows {
            resources.push(resource?);
        }
        Ok(resources)
    }

    fn resource(&self, id: ResourceId) -> StoreResult<Option<Resource>> {
        let resource = self
            .conn
            .query_row(
                "SELECT id, name FROM resources WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Resource {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(resource)
    }

    fn insert_resource(&mut self, name: &str) -> StoreResult<Resource> {
        self.conn
            .execute("INSERT INTO resources (name) VALUES (?1)", params![name])?;
        Ok(Resource {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    fn rename_resource(&mut self, id: ResourceId, name: &str) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "UPDATE resources SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        Ok(changed > 0)
    }

    fn remove_resource(&mut self, id: ResourceId) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM resources WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn work_items(&self) -> StoreResult<Vec<WorkItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, item_json FROM work_items ORDER BY id ASC")?;
        let rows = stmt.query_map([], item_from_row)?;
        let mut items = Vec::new();
        for row in rows {
            let (id, json) = row?;
            items.push(decode_item(id, &json)?);
        }
        Ok(items)
    }

    fn work_item(&self, id: WorkItemId) -> StoreResult<Option<WorkItem>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, item_json FROM work_items WHERE id = ?1",
                params![id],
                item_from_row,
            )
            .optional()?;
        row.map(|(id, json)| decode_item(id, &json)).transpose()
    }

    fn insert_work_item(&mut self, draft: WorkItemDraft) -> StoreResult<WorkItem> {
        let json = serde_json::to_string(&draft)?;
        self.conn
            .execute("INSERT INTO work_items (item_json) VALUES (?1)", params![json])?;
        Ok(WorkItem::from_draft(self.conn.last_insert_rowid(), draft))
    }

    fn update_work_item(&mut self, item: &WorkItem) -> StoreResult<bool> {
        let json = serde_json::to_string(&item.to_draft())?;
        let changed = self.conn.execute(
            "UPDATE work_items SET item_json = ?1 WHERE id = ?2",
            params![json, item.id],
        )?;
        Ok(changed > 0)
    }

    fn remove_work_item(&mut self, id: WorkItemId) -> StoreResult<bool> {
        self.conn.execute(
            "DELETE FROM assignments WHERE work_item_id = ?1",
            params![id],
        )?;
        let changed = self
            .conn
            .execute("DELETE FROM work_items WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn assignments(&self) -> StoreResult<Vec<Assignment>> {
        let mut stmt = self.conn.prepare(
            "SELECT work_item_id, resource_id, ordering_key FROM assignments ORDER BY work_item_id ASC",
        )?;
        let rows = stmt.query_map([], assignment_from_row)?;
        let mut assignments = Vec::new();
        for assignment in rows {
            assignments.push(assignment?);
        }
        Ok(assignments)
    }

    fn assignment(&self, id: WorkItemId) -> StoreResult<Option<Assignment>> {
        let assignment = self
            .conn
            .query_row(
                "SELECT work_item_id, resource_id, ordering_key FROM assignments WHERE work_item_id = ?1",
                params![id],
                assignment_from_row,
            )
            .optional()?;
        Ok(assignment)
    }

    fn queue(&self, resource: Option<ResourceId>) -> StoreResult<Vec<QueueEntry>> {
        // `IS` matches NULL to NULL, which selects the pool.
        let mut stmt = self.conn.prepare(
            "SELECT work_item_id, ordering_key FROM assignments
             WHERE resource_id IS ?1
             ORDER BY ordering_key ASC, work_item_id ASC",
        )?;
        let rows = stmt.query_map(params![resource], |row| {
            Ok(QueueEntry {
                work_item_id: row.get(0)?,
                key: OrderingKey::new(row.get(1)?),
            })
        })?;
        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    fn set_assignment(&mut self, assignment: Assignment) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO assignments (work_item_id, resource_id, ordering_key)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(work_item_id) DO UPDATE SET
                resource_id = excluded.resource_id,
                ordering_key = excluded.ordering_key",
            params![
                assignment.work_item_id,
                assignment.resource_id,
                assignment.key.value()
            ],
        )?;
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.conn.execute_batch(
            "DELETE FROM assignments; DELETE FROM work_items; DELETE FROM resources;",
        )?;
        Ok(())
    }

    fn restore(&mut self, snapshot: &BoardSnapshot) -> StoreResult<()> {
        self.clear()?;
        for resource in &snapshot.resources {
            self.conn.execute(
                "INSERT INTO resources (id, name) VALUES (?1, ?2)",
                params![resource.id, resource.name],
            )?;
        }
        for item in &snapshot.work_items {
            self.insert_item_with_id(item)?;
        }
        for assignment in &snapshot.assignments {
            self.set_assignment(*assignment)?;
        }
        Ok(())
    }
}
