//! # dairy-audit
//!
//! Audit trail for the dairy admin backend.
//!
//! This crate provides:
//! - A change-diff engine comparing two entity snapshots field by field
//! - Validation of candidate records against the action and entity vocabularies
//! - An append-only writer with pluggable storage (memory, JSON Lines file)
//! - A paginated query service with principal projection
//!
//! ## Record Shape
//!
//! Records serialize as camelCase JSON:
//!
//! ```json
//! {"id": "...", "action": "UPDATE", "entity": "BMC", "entityId": "...",
//!  "performedBy": "...", "changes": [{"field": "name", "oldValue": "A",
//!  "newValue": "B", "reason": "rename"}], "metadata": {"timestamp": 1700000000000},
//!  "status": "SUCCESS", "createdAt": "...", "updatedAt": "..."}
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dairy_audit::{ActionType, AuditLogger, AuditRequest, EntityType};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = AuditLogger::new(dairy_core::AuditConfig::default())?;
//!
//! logger
//!     .record(
//!         AuditRequest::builder(ActionType::Update, EntityType::Bmc)
//!             .entity_id("6650c0ffee")
//!             .performed_by("664fadmin")
//!             .old_data(json!({"name": "Anand North"}))
//!             .new_data(json!({"name": "Anand Central"}))
//!             .reason("Updated BMC details")
//!             .build(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod diff;
pub mod error;
pub mod logger;
pub mod query;
pub mod record;
pub mod storage;
pub mod validate;

pub use diff::compute_changes;
pub use error::AuditError;
pub use logger::AuditLogger;
pub use query::{
    AuditFilter, AuditPage, AuditRecordView, AuditSort, PageInfo, Pagination, PerformedBy,
    PrincipalDirectory, PrincipalProjection, SortField, SortOrder,
};
pub use record::{
    ActionType, AuditRecord, AuditRequest, AuditRequestBuilder, AuditStatus, EntityType,
    ErrorDetails, FieldChange, PendingRecord, SYSTEM_PRINCIPAL,
};
pub use storage::{AuditStorage, FileStorage, MemoryStorage, NullStorage, create_storage};
pub use validate::{ValidatedRequest, parse_action, parse_entity, validate};
