//! Audit storage backends.
//!
//! Stores are append-only: records can be inserted and read, never updated or
//! deleted. Every backend assigns the record id and `createdAt`/`updatedAt`
//! at insert time.

use crate::error::AuditError;
use crate::query::{AuditFilter, AuditSort};
use crate::record::{AuditRecord, PendingRecord};
use async_trait::async_trait;
use chrono::Utc;
use dairy_core::config::{AuditConfig, StorageBackend};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Trait for audit storage backends.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Persist a record and return it with id and timestamps assigned.
    async fn insert(&self, record: PendingRecord) -> Result<AuditRecord, AuditError>;

    /// Records matching `filter`, sorted, then `offset`/`limit` applied.
    async fn query(
        &self,
        filter: &AuditFilter,
        sort: AuditSort,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AuditRecord>, AuditError>;

    /// Number of records matching `filter`.
    async fn count(&self, filter: &AuditFilter) -> Result<usize, AuditError>;

    /// Get a record by id.
    async fn get(&self, id: Uuid) -> Result<Option<AuditRecord>, AuditError>;
}

/// Create a storage backend based on configuration.
pub fn create_storage(config: &AuditConfig) -> Result<Arc<dyn AuditStorage>, AuditError> {
    if !config.enabled {
        return Ok(Arc::new(NullStorage));
    }
    match config.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
        StorageBackend::File => Ok(Arc::new(FileStorage::open(&config.storage.file_path)?)),
    }
}

/// Filter, stably sort and page a slice of records kept in insertion order.
fn select(
    records: &[AuditRecord],
    filter: &AuditFilter,
    sort: AuditSort,
    offset: usize,
    limit: usize,
) -> Vec<AuditRecord> {
    let mut matched: Vec<&AuditRecord> = records.iter().filter(|r| filter.matches(r)).collect();
    // sort_by is stable, so ties keep insertion order
    matched.sort_by(|a, b| sort.compare(a, b));
    matched
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect()
}

fn lock_poisoned(e: impl std::fmt::Display) -> AuditError {
    AuditError::StorageError(format!("audit store lock poisoned: {}", e))
}

/// Storage that discards records. Used when auditing is disabled.
pub struct NullStorage;

#[async_trait]
impl AuditStorage for NullStorage {
    async fn insert(&self, record: PendingRecord) -> Result<AuditRecord, AuditError> {
        Ok(record.into_record(Utc::now()))
    }

    async fn query(
        &self,
        _filter: &AuditFilter,
        _sort: AuditSort,
        _offset: usize,
        _limit: usize,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        Ok(vec![])
    }

    async fn count(&self, _filter: &AuditFilter) -> Result<usize, AuditError> {
        Ok(0)
    }

    async fn get(&self, _id: Uuid) -> Result<Option<AuditRecord>, AuditError> {
        Ok(None)
    }
}

/// In-memory storage.
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with already persisted records, oldest first.
    pub fn from_records(records: Vec<AuditRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditStorage for MemoryStorage {
    async fn insert(&self, record: PendingRecord) -> Result<AuditRecord, AuditError> {
        let record = record.into_record(Utc::now());
        self.records
            .write()
            .map_err(lock_poisoned)?
            .push(record.clone());
        Ok(record)
    }

    async fn query(
        &self,
        filter: &AuditFilter,
        sort: AuditSort,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        let records = self.records.read().map_err(lock_poisoned)?;
        Ok(select(&records, filter, sort, offset, limit))
    }

    async fn count(&self, filter: &AuditFilter) -> Result<usize, AuditError> {
        let records = self.records.read().map_err(lock_poisoned)?;
        Ok(records.iter().filter(|r| filter.matches(r)).count())
    }

    async fn get(&self, id: Uuid) -> Result<Option<AuditRecord>, AuditError> {
        let records = self.records.read().map_err(lock_poisoned)?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }
}

/// JSON Lines file storage.
///
/// Each record is appended as one line. Existing lines are loaded on open and
/// served from memory; malformed lines are skipped with a warning.
pub struct FileStorage {
    path: PathBuf,
    records: RwLock<Vec<AuditRecord>>,
}

impl FileStorage {
    /// Open (or create) the log file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let records = if path.exists() {
            Self::load(&path)?
        } else {
            Vec::new()
        };

        tracing::debug!(path = %path.display(), records = records.len(), "Opened audit log");

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Read every well-formed record from a JSON Lines file.
    pub fn load(path: &Path) -> Result<Vec<AuditRecord>, AuditError> {
        let file = fs::File::open(path)?;
        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        line = index + 1,
                        error = %e,
                        "Skipping malformed audit record"
                    );
                }
            }
        }
        Ok(records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditStorage for FileStorage {
    async fn insert(&self, record: PendingRecord) -> Result<AuditRecord, AuditError> {
        let record = record.into_record(Utc::now());
        let json = serde_json::to_string(&record)?;

        // Hold the write lock across the append so lines never interleave
        let mut records = self.records.write().map_err(lock_poisoned)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", json)?;
        records.push(record.clone());

        Ok(record)
    }

    async fn query(
        &self,
        filter: &AuditFilter,
        sort: AuditSort,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        let records = self.records.read().map_err(lock_poisoned)?;
        Ok(select(&records, filter, sort, offset, limit))
    }

    async fn count(&self, filter: &AuditFilter) -> Result<usize, AuditError> {
        let records = self.records.read().map_err(lock_poisoned)?;
        Ok(records.iter().filter(|r| filter.matches(r)).count())
    }

    async fn get(&self, id: Uuid) -> Result<Option<AuditRecord>, AuditError> {
        let records = self.records.read().map_err(lock_poisoned)?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }
}
