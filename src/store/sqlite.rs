//! SQLite backend for both store ports. The connection is blocking, so every
//! statement runs on the blocking pool behind a mutex.

use super::{CheckpointStore, MutableFields, PersistedRow, ProfileStore};
use crate::ingest::checkpoint::{Checkpoint, ScanMode};
use anyhow::{anyhow, Context, Result};
use futures::future::BoxFuture;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS realms (
        name TEXT PRIMARY KEY NOT NULL,
        id TEXT NOT NULL,
        number INTEGER NOT NULL,
        mint_time INTEGER,
        mint_address TEXT,
        owner_address TEXT,
        profile_pointer TEXT,
        created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
        updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    );
    CREATE INDEX IF NOT EXISTS realms_id ON realms (id);
    CREATE TABLE IF NOT EXISTS checkpoints (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    );
";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite database {}", path.display()))?;
        Self::bootstrap(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite")?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("failed to apply sqlite schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| anyhow!("sqlite connection mutex poisoned"))?;
            operation(&guard)
        })
        .await
        .context("sqlite task panicked")?
    }
}

fn to_sql_number(value: u64) -> Result<i64> {
    i64::try_from(value).with_context(|| format!("atomical number {value} exceeds sqlite range"))
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<PersistedRow> {
    let number: i64 = row.get(2)?;
    let sequence_number = u64::try_from(number).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Integer, Box::new(err))
    })?;
    Ok(PersistedRow {
        name: row.get(0)?,
        id: row.get(1)?,
        sequence_number,
        mint_time: row.get(3)?,
        mint_address: row.get(4)?,
        owner_address: row.get(5)?,
        profile_pointer: row.get(6)?,
    })
}

impl ProfileStore for SqliteStore {
    fn find<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Option<PersistedRow>>> {
        let name = name.to_owned();
        Box::pin(self.with_conn(move |conn| {
            conn.query_row(
                "SELECT name, id, number, mint_time, mint_address, owner_address, profile_pointer
                 FROM realms WHERE name = ?1",
                params![name],
                map_row,
            )
            .optional()
            .with_context(|| format!("failed to look up realm {name}"))
        }))
    }

    fn insert<'a>(&'a self, row: &'a PersistedRow) -> BoxFuture<'a, Result<()>> {
        let row = row.clone();
        Box::pin(self.with_conn(move |conn| {
            let number = to_sql_number(row.sequence_number)?;
            conn.execute(
                "INSERT INTO realms
                     (name, id, number, mint_time, mint_address, owner_address, profile_pointer)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.name,
                    row.id,
                    number,
                    row.mint_time,
                    row.mint_address,
                    row.owner_address,
                    row.profile_pointer,
                ],
            )
            .with_context(|| format!("failed to insert realm {}", row.name))?;
            Ok(())
        }))
    }

    fn update_mutable<'a>(
        &'a self,
        name: &'a str,
        fields: &'a MutableFields,
    ) -> BoxFuture<'a, Result<()>> {
        let name = name.to_owned();
        let fields = fields.clone();
        Box::pin(self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE realms
                     SET owner_address = ?2, profile_pointer = ?3,
                         updated_at = strftime('%s', 'now')
                     WHERE name = ?1",
                    params![name, fields.owner_address, fields.profile_pointer],
                )
                .with_context(|| format!("failed to update realm {name}"))?;
            if changed == 0 {
                return Err(anyhow!("realm {name} does not exist"));
            }
            Ok(())
        }))
    }
}

impl CheckpointStore for SqliteStore {
    fn load(&self, mode: ScanMode) -> BoxFuture<'_, Result<Option<Checkpoint>>> {
        Box::pin(self.with_conn(move |conn| {
            let value: Option<String> = conn
                .query_row(
                    "SELECT value FROM checkpoints WHERE key = ?1",
                    params![mode.key()],
                    |row| row.get(0),
                )
                .optional()
                .with_context(|| format!("failed to read checkpoint {mode}"))?;

            value
                .map(|json| {
                    serde_json::from_str(&json)
                        .with_context(|| format!("checkpoint {mode} is not valid JSON: {json}"))
                })
                .transpose()
        }))
    }

    fn save(&self, mode: ScanMode, checkpoint: Checkpoint) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.with_conn(move |conn| {
            let json = serde_json::to_string(&checkpoint).context("failed to encode checkpoint")?;
            conn.execute(
                "INSERT INTO checkpoints (key, value) VALUES (?1, ?2)
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value",
                params![mode.key(), json],
            )
            .with_context(|| format!("failed to write checkpoint {mode}"))?;
            Ok(())
        }))
    }
}
