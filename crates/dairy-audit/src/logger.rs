//! Audit logger: the write and read entry points of the audit trail.

use chrono::Utc;
use dairy_core::AuditConfig;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::diff::compute_changes;
use crate::error::AuditError;
use crate::query::{
    AuditFilter, AuditPage, AuditSort, PageInfo, Pagination, PerformedBy, PrincipalDirectory,
    PrincipalProjection,
};
use crate::record::{AuditRecord, AuditRequest, PendingRecord, SYSTEM_PRINCIPAL};
use crate::storage::{AuditStorage, MemoryStorage, NullStorage, create_storage};
use crate::validate::validate;

/// Metadata key holding the write time in epoch milliseconds.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// The main audit logger.
///
/// `record` validates, diffs and persists one audit event; `list` serves
/// filtered, sorted and paginated reads with `performedBy` expanded through
/// an optional [`PrincipalDirectory`].
pub struct AuditLogger {
    config: AuditConfig,
    storage: Arc<dyn AuditStorage>,
    directory: Option<Arc<dyn PrincipalDirectory>>,
}

impl AuditLogger {
    /// Create a new audit logger with the given configuration.
    pub fn new(config: AuditConfig) -> Result<Self, AuditError> {
        let storage = create_storage(&config)?;
        Ok(Self::with_storage(config, storage))
    }

    /// Create a logger with a custom storage backend.
    pub fn with_storage(config: AuditConfig, storage: Arc<dyn AuditStorage>) -> Self {
        Self {
            config,
            storage,
            directory: None,
        }
    }

    /// Create a logger that validates but persists nothing.
    pub fn disabled() -> Self {
        Self::with_storage(
            AuditConfig {
                enabled: false,
                ..Default::default()
            },
            Arc::new(NullStorage),
        )
    }

    /// Create a logger backed by process memory (useful for tests).
    pub fn in_memory() -> Self {
        Self::with_storage(AuditConfig::default(), Arc::new(MemoryStorage::new()))
    }

    /// Attach the directory used to expand `performedBy` in query results.
    pub fn with_directory(mut self, directory: Arc<dyn PrincipalDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Check if records are persisted.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Validate, diff and persist one audit record.
    ///
    /// Validation failures are returned unchanged and nothing is written.
    pub async fn record(&self, request: AuditRequest) -> Result<AuditRecord, AuditError> {
        let validated = validate(&request)?;

        let changes = match (&request.old_data, &request.new_data) {
            (Some(old), Some(new)) if !old.is_null() && !new.is_null() => Some(compute_changes(
                old,
                new,
                request.reason.as_deref().unwrap_or_default(),
            )),
            _ => None,
        };

        let mut metadata = request.metadata;
        metadata.insert(
            TIMESTAMP_KEY.to_string(),
            Value::from(Utc::now().timestamp_millis()),
        );

        let pending = PendingRecord {
            action: validated.action,
            entity: validated.entity,
            entity_id: validated.entity_id,
            performed_by: request
                .performed_by
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| SYSTEM_PRINCIPAL.to_string()),
            changes,
            reason: request.reason,
            metadata,
            status: request.status,
            error_details: request.error_details,
        };

        let record = self.storage.insert(pending).await?;

        tracing::debug!(
            audit_id = %record.id,
            action = %record.action,
            entity = %record.entity,
            entity_id = record.entity_id.as_deref().unwrap_or("-"),
            performed_by = %record.performed_by,
            status = %record.status,
            persisted = self.config.enabled,
            "Audit record"
        );

        Ok(record)
    }

    /// Return one page of records matching `filter`.
    ///
    /// The page and the total count are fetched concurrently.
    pub async fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
        sort: AuditSort,
    ) -> Result<AuditPage, AuditError> {
        pagination.validate()?;
        filter.validate()?;
        let offset = pagination.offset()?;

        let (records, total) = tokio::try_join!(
            self.storage.query(&filter, sort, offset, pagination.limit),
            self.storage.count(&filter),
        )?;

        let principals = self.project_principals(&records).await;
        let records = records
            .into_iter()
            .map(|record| {
                record.map_performer(|id| match principals.get(&id) {
                    Some(projection) => PerformedBy::Principal(projection.clone()),
                    None => PerformedBy::Id(id),
                })
            })
            .collect();

        Ok(AuditPage {
            records,
            page_info: PageInfo::new(total, pagination),
        })
    }

    /// Get a single record by id.
    pub async fn get(&self, id: Uuid) -> Result<Option<AuditRecord>, AuditError> {
        self.storage.get(id).await
    }

    async fn project_principals(
        &self,
        records: &[AuditRecord],
    ) -> HashMap<String, PrincipalProjection> {
        let mut principals = HashMap::new();
        let Some(ref directory) = self.directory else {
            return principals;
        };
        for record in records {
            let id = &record.performed_by;
            if principals.contains_key(id) {
                continue;
            }
            if let Some(projection) = directory.project(id).await {
                principals.insert(id.clone(), projection);
            }
        }
        principals
    }
}
