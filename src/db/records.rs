use crate::db::connection::Database;
use crate::domain::AnalysisRecord;
use crate::errors::ServerError;
use crate::pipeline::{PersistenceError, RecordSink};
use rusqlite::params;
use tracing::warn;

/// Appends records to `analysis_records`, one insert per record.
#[derive(Debug, Clone)]
pub struct SqliteSink {
    db: Database,
}

impl SqliteSink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl RecordSink for SqliteSink {
    fn append(&mut self, record: &AnalysisRecord) -> Result<(), PersistenceError> {
        let write_err = |message: String| PersistenceError::Write {
            record_id: record.record_id.clone(),
            message,
        };

        let payload = serde_json::to_string(record).map_err(|e| write_err(e.to_string()))?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO analysis_records
                    (record_id, analyzed_at, search_location, rank, address_key,
                     full_address, deal_score, is_degraded, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.record_id,
                    record.analyzed_at,
                    record.search_location,
                    record.rank as i64,
                    record.address_key,
                    record.listing.address.full(),
                    record.deal.score.map(i64::from),
                    record.is_degraded(),
                    payload,
                ],
            )
            .map(|_| ())
            .map_err(|e| write_err(e.to_string()))
        })
    }
}

/// Most recent records first; within one run, by rank.
/// Rows whose payload no longer decodes are logged and left out.
pub fn recent_records(db: &Database, limit: usize) -> Result<Vec<AnalysisRecord>, ServerError> {
    let payloads = db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT record_id, payload FROM analysis_records
             ORDER BY analyzed_at DESC, rank ASC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok::<_, ServerError>(out)
    })?;

    Ok(payloads
        .iter()
        .filter_map(|(record_id, payload)| match serde_json::from_str(payload) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(%record_id, error = %e, "skipping undecodable record payload");
                None
            }
        })
        .collect())
}

pub fn count_records(db: &Database) -> Result<i64, ServerError> {
    db.with_conn(|conn| {
        conn.query_row("SELECT COUNT(*) FROM analysis_records", [], |r| r.get(0))
            .map_err(ServerError::from)
    })
}
