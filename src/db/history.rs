use crate::db::connection::Database;
use crate::domain::normalize_address;
use crate::pipeline::{HistoryStore, PersistenceError};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

/// Freshness history in the `address_history` table.
#[derive(Debug, Clone)]
pub struct SqliteHistory {
    db: Database,
}

impl SqliteHistory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl HistoryStore for SqliteHistory {
    fn last_analyzed(&self, address_key: &str) -> Result<Option<DateTime<Utc>>, PersistenceError> {
        let key = normalize_address(address_key);
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT last_analyzed_at FROM address_history WHERE address_key = ?1",
                params![key],
                |row| row.get::<_, DateTime<Utc>>(0),
            )
            .optional()
            .map_err(PersistenceError::from)
        })
    }

    fn record(&mut self, address_key: &str, at: DateTime<Utc>) -> Result<(), PersistenceError> {
        let key = normalize_address(address_key);
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO address_history (address_key, last_analyzed_at)
                 VALUES (?1, ?2)
                 ON CONFLICT(address_key) DO UPDATE
                 SET last_analyzed_at = excluded.last_analyzed_at
                 WHERE excluded.last_analyzed_at > address_history.last_analyzed_at",
                params![key, at],
            )
            .map(|_| ())
            .map_err(PersistenceError::from)
        })
    }
}
