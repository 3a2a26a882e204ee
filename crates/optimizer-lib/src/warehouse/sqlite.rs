//! SQLite-backed warehouse
//!
//! Each knowledge table is created on first merge with `chunk_id` as its
//! primary key. Merges run inside one transaction on a blocking thread.

use super::{validate_identifier, Warehouse};
use crate::error::WarehouseError;
use crate::knowledge::KnowledgeChunk;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

pub struct SqliteWarehouse {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteWarehouse {
    /// Open or create the database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WarehouseError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                WarehouseError::Task(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened SQLite warehouse");
        Self::init(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self, WarehouseError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, WarehouseError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS deployed_models (model_name TEXT PRIMARY KEY)",
            [],
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, WarehouseError> {
        conn.lock()
            .map_err(|_| WarehouseError::Task("sqlite connection lock poisoned".to_string()))
    }

    pub fn register_model(&self, name: &str) -> Result<(), WarehouseError> {
        let conn = Self::lock(&self.conn)?;
        conn.execute(
            "INSERT OR IGNORE INTO deployed_models (model_name) VALUES (?1)",
            params![name],
        )?;
        Ok(())
    }

    /// Rows in a knowledge table; zero when the table does not exist yet
    pub fn count_rows(&self, table: &str) -> Result<u64, WarehouseError> {
        let table = validate_identifier(table)?;
        let conn = Self::lock(&self.conn)?;
        if !table_exists(&conn, table)? {
            return Ok(0);
        }
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    pub fn fetch_chunk(
        &self,
        table: &str,
        chunk_id: &str,
    ) -> Result<Option<KnowledgeChunk>, WarehouseError> {
        let table = validate_identifier(table)?;
        let conn = Self::lock(&self.conn)?;
        if !table_exists(&conn, table)? {
            return Ok(None);
        }

        let raw = conn
            .query_row(
                &format!(
                    "SELECT chunk_id, topic, title, content, url, word_count, batch_id, last_updated \
                     FROM \"{}\" WHERE chunk_id = ?1",
                    table
                ),
                params![chunk_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, u32>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((chunk_id, topic, title, content, url, word_count, batch_id, last_updated)) = raw
        else {
            return Ok(None);
        };

        Ok(Some(KnowledgeChunk {
            chunk_id,
            topic,
            title,
            content,
            url,
            word_count,
            batch_id: Uuid::parse_str(&batch_id)
                .map_err(|e| WarehouseError::Response(format!("batch_id: {}", e)))?,
            last_updated: DateTime::parse_from_rfc3339(&last_updated)
                .map_err(|e| WarehouseError::Response(format!("last_updated: {}", e)))?
                .with_timezone(&Utc),
        }))
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, WarehouseError> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn merge_rows(
    conn: &mut Connection,
    table: &str,
    rows: &[KnowledgeChunk],
) -> Result<u64, WarehouseError> {
    let tx = conn.transaction()?;
    tx.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                chunk_id TEXT PRIMARY KEY,
                topic TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                url TEXT NOT NULL,
                word_count INTEGER NOT NULL,
                batch_id TEXT NOT NULL,
                last_updated TEXT NOT NULL
            )",
            table
        ),
        [],
    )?;

    let mut affected = 0u64;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO \"{}\" (chunk_id, topic, title, content, url, word_count, batch_id, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(chunk_id) DO UPDATE SET
                topic = excluded.topic,
                title = excluded.title,
                content = excluded.content,
                url = excluded.url,
                word_count = excluded.word_count,
                batch_id = excluded.batch_id,
                last_updated = excluded.last_updated",
            table
        ))?;

        for row in rows {
            affected += stmt.execute(params![
                row.chunk_id,
                row.topic,
                row.title,
                row.content,
                row.url,
                row.word_count,
                row.batch_id.to_string(),
                row.last_updated.to_rfc3339(),
            ])? as u64;
        }
    }

    tx.commit()?;
    Ok(affected)
}

#[async_trait]
impl Warehouse for SqliteWarehouse {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn merge_knowledge(
        &self,
        table: &str,
        rows: &[KnowledgeChunk],
    ) -> Result<u64, WarehouseError> {
        let table = validate_identifier(table)?.to_string();
        let rows = rows.to_vec();
        let conn = Arc::clone(&self.conn);

        let affected = tokio::task::spawn_blocking(move || {
            let mut guard = Self::lock(&conn)?;
            merge_rows(&mut guard, &table, &rows)
        })
        .await
        .map_err(|e| WarehouseError::Task(e.to_string()))??;

        debug!(affected, "Merged knowledge rows into SQLite");
        Ok(affected)
    }

    async fn list_deployed_model_names(&self) -> Result<BTreeSet<String>, WarehouseError> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let guard = Self::lock(&conn)?;
            let mut stmt = guard.prepare("SELECT model_name FROM deployed_models")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<BTreeSet<_>, _>>()?;
            Ok::<_, WarehouseError>(names)
        })
        .await
        .map_err(|e| WarehouseError::Task(e.to_string()))?
    }
}
