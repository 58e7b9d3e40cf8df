use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{
    helpers::{parse_datetime, parse_kind, to_i64, to_u64},
    Database,
};
use crate::models::ViolationRecord;

fn row_to_record(row: &Row) -> Result<ViolationRecord> {
    let kind: String = row.get("kind")?;
    let timestamp: String = row.get("timestamp")?;
    let offset_ms: i64 = row.get("offset_ms")?;

    Ok(ViolationRecord {
        session_id: row.get("session_id")?,
        kind: parse_kind(&kind)?,
        message: row.get("message")?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
        offset_ms: to_u64(offset_ms, "offset_ms")?,
    })
}

impl Database {
    pub async fn insert_violation(&self, record: &ViolationRecord) -> Result<i64> {
        let record = record.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO violations (session_id, kind, message, timestamp, offset_ms, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.session_id,
                    record.kind.as_str(),
                    record.message,
                    record.timestamp.to_rfc3339(),
                    to_i64(record.offset_ms)?,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Violations of one session in the order they happened.
    pub async fn list_violations_for_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<ViolationRecord>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, kind, message, timestamp, offset_ms
                 FROM violations
                 WHERE session_id = ?1
                 ORDER BY offset_ms ASC, id ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }
            Ok(records)
        })
        .await
    }

    pub async fn count_violations_for_session(&self, session_id: &str) -> Result<u64> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM violations WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )?;
            to_u64(count, "count")
        })
        .await
    }
}
