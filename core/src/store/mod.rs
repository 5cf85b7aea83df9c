//! SQLite persistence layer for raw metric events.
//!
//! RULE: Only the store talks to the database.
//! The engine reads through the MetricStore trait and never executes SQL.

use crate::{
    error::EngineResult,
    metric::{parse_timestamp, MetricEvent, MetricFilter, MetricStore},
};
use chrono::SecondsFormat;
use rusqlite::{params, Connection};

pub struct SqliteMetricStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl SqliteMetricStore {
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn, path: None })
    }

    /// A second connection to the same database file, for use on another
    /// thread. An in-memory store reopens as a fresh, empty database.
    pub fn reopen(&self) -> EngineResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_metric_event.sql"))?;
        Ok(())
    }

    // ── Metric events ──────────────────────────────────────────

    pub fn insert_event(&self, event: &MetricEvent) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO metric_event (agent_id, metric_key, value, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                &event.agent_id,
                &event.metric_key,
                event.value,
                event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            ],
        )?;
        Ok(())
    }

    /// Insert a batch inside one transaction.
    pub fn insert_events(&mut self, events: &[MetricEvent]) -> EngineResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO metric_event (agent_id, metric_key, value, recorded_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for event in events {
                stmt.execute(params![
                    &event.agent_id,
                    &event.metric_key,
                    event.value,
                    event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("Inserted {} metric events", events.len());
        Ok(())
    }

    /// Number of stored events for an agent.
    pub fn event_count(&self, agent_id: &str) -> EngineResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM metric_event WHERE agent_id = ?1",
            params![agent_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Number of stored events across all agents.
    pub fn total_events(&self) -> EngineResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM metric_event", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl MetricStore for SqliteMetricStore {
    /// Rows come back in insertion order, so among equal timestamps
    /// the most recent write is seen last.
    fn query(&self, filter: &MetricFilter) -> EngineResult<Vec<MetricEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT agent_id, metric_key, value, recorded_at
             FROM metric_event WHERE agent_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![&filter.agent_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(agent_id, metric_key, value, recorded_at)| {
                Ok(MetricEvent {
                    agent_id,
                    metric_key,
                    value,
                    timestamp: parse_timestamp(&recorded_at)?,
                })
            })
            .collect()
    }
}
