//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! The orchestrator reaches it through the `ProductCatalog` and
//! `SimulationStore` traits and never executes SQL directly.
//!
//! Two databases: the product catalog (read-only here) and the
//! simulation history (append-only). They never share a transaction.

mod catalog;
mod history;

pub use catalog::SqliteProductCatalog;
pub use history::SqliteSimulationStore;

use crate::error::{SimError, SimResult};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One database, two connections: every write goes through `writer`,
/// every query through `reader`. A long report or page holds only the
/// reader lock, so inserts proceed alongside it.
pub struct Database {
    writer: Arc<Mutex<Connection>>,
    reader: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: &str) -> SimResult<Self> {
        if path == ":memory:" {
            return Self::in_memory();
        }
        let writer = open_connection(path)?;
        // WAL: readers keep their snapshot while the writer commits.
        writer.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        let reader = open_connection(path)?;
        reader.execute_batch("PRAGMA query_only=ON;")?;
        Ok(Self::from_pair(writer, reader))
    }

    /// Open an in-memory database (used in tests). Both connections
    /// attach to one uniquely named shared-cache database.
    pub fn in_memory() -> SimResult<Self> {
        let uri = format!("file:credit_sim_{}?mode=memory&cache=shared", Uuid::new_v4().simple());
        let writer = open_connection(&uri)?;
        let reader = open_connection(&uri)?;
        // Shared-cache readers otherwise take table locks that stall the writer.
        reader.execute_batch("PRAGMA read_uncommitted=ON; PRAGMA query_only=ON;")?;
        Ok(Self::from_pair(writer, reader))
    }

    fn from_pair(writer: Connection, reader: Connection) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            reader: Arc::new(Mutex::new(reader)),
        }
    }

    pub fn migrate_catalog(&self) -> SimResult<()> {
        self.writer
            .lock()
            .execute_batch(include_str!("../../../migrations/001_product_catalog.sql"))?;
        Ok(())
    }

    pub fn migrate_history(&self) -> SimResult<()> {
        self.writer
            .lock()
            .execute_batch(include_str!("../../../migrations/002_simulation_history.sql"))?;
        Ok(())
    }

    /// Run a query on the blocking pool, on the reader connection.
    pub(crate) async fn read<T, F>(&self, f: F) -> SimResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> SimResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.reader);
        run_blocking(move || f(&conn.lock())).await
    }

    /// Run a write on the blocking pool, on the writer connection.
    pub(crate) async fn write<T, F>(&self, f: F) -> SimResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> SimResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.writer);
        run_blocking(move || f(&mut conn.lock())).await
    }

    /// Synchronous reader access for out-of-band tooling.
    pub(crate) fn read_now<T>(&self, f: impl FnOnce(&Connection) -> SimResult<T>) -> SimResult<T> {
        f(&self.reader.lock())
    }

    /// Synchronous writer access for out-of-band tooling.
    pub(crate) fn write_now<T>(&self, f: impl FnOnce(&mut Connection) -> SimResult<T>) -> SimResult<T> {
        f(&mut self.writer.lock())
    }
}

fn open_connection(path: &str) -> SimResult<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_URI,
    )?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

async fn run_blocking<T, F>(f: F) -> SimResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> SimResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SimError::Other(anyhow::anyhow!("store task failed: {e}")))?
}

// ── Column codecs ─────────────────────────────────────────────

pub(crate) fn decode_decimal(column: &'static str, raw: &str) -> SimResult<Decimal> {
    Decimal::from_str(raw).map_err(|_| SimError::CorruptValue {
        column,
        value: raw.to_string(),
    })
}

pub(crate) fn decode_optional_decimal(column: &'static str, raw: Option<&str>) -> SimResult<Option<Decimal>> {
    raw.map(|r| decode_decimal(column, r)).transpose()
}

pub(crate) fn decode_term(column: &'static str, raw: i64) -> SimResult<u32> {
    u32::try_from(raw).map_err(|_| SimError::CorruptValue {
        column,
        value: raw.to_string(),
    })
}

pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(column: &'static str, raw: &str) -> SimResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| SimError::CorruptValue {
            column,
            value: raw.to_string(),
        })
}
