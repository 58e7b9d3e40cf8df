//! Violation persistence. Sinks are best-effort: the proctoring path fires a
//! write and moves on, so nothing here may block or fail strike processing.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::db::Database;
use crate::models::ViolationRecord;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "violation_sink";

use crate::log_info;

#[async_trait]
pub trait ViolationSink: Send + Sync {
    async fn log(&self, record: &ViolationRecord) -> Result<()>;
}

/// Keeps records in memory; for tests and dry runs.
#[derive(Default)]
pub struct MemoryViolationSink {
    records: Mutex<Vec<ViolationRecord>>,
}

impl MemoryViolationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ViolationRecord> {
        match self.records.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ViolationSink for MemoryViolationSink {
    async fn log(&self, record: &ViolationRecord) -> Result<()> {
        let mut guard = match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(record.clone());
        Ok(())
    }
}

/// SQLite-backed sink, also the ingest point for records mirrored in from
/// other processes.
#[derive(Clone)]
pub struct SqliteViolationSink {
    db: Database,
}

impl SqliteViolationSink {
    pub fn open(path: PathBuf) -> Result<Self> {
        let db = Database::new(path).context("failed to open violation database")?;
        log_info!("persisting violations to {}", db.path().display());
        Ok(Self { db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Validate and store an externally supplied record. Validation errors
    /// are `RecordError`s (reachable through `downcast_ref`) and leave the
    /// store untouched.
    pub async fn ingest_json(&self, value: &Value) -> Result<ViolationRecord> {
        let record = ViolationRecord::from_json(value)?;
        self.db
            .insert_violation(&record)
            .await
            .context("failed to store ingested violation")?;
        Ok(record)
    }

    pub async fn session_violations(&self, session_id: &str) -> Result<Vec<ViolationRecord>> {
        self.db.list_violations_for_session(session_id).await
    }
}

#[async_trait]
impl ViolationSink for SqliteViolationSink {
    async fn log(&self, record: &ViolationRecord) -> Result<()> {
        self.db
            .insert_violation(record)
            .await
            .with_context(|| format!("failed to persist {} violation", record.kind.as_str()))?;
        Ok(())
    }
}
