//! Audit record types.
//!
//! An [`AuditRecord`] is a write-once fact: "principal P performed action A on
//! entity E (id X) at time T, from location L, changing fields F". Records are
//! produced from an [`AuditRequest`] by the writer after validation and diffing.

use crate::error::AuditError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Principal recorded when no authenticated caller exists.
pub const SYSTEM_PRINCIPAL: &str = "SYSTEM";

/// Entity literal accepted even if the entity vocabulary ever drops it.
pub const LEGACY_SYSTEM_ENTITY: &str = "SYSTEM";

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every member of the vocabulary.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = AuditError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(AuditError::invalid(format!(
                        concat!("Invalid ", $label, " type: {}"),
                        other
                    ))),
                }
            }
        }
    };
}

vocabulary! {
    /// Kind of operation being audited.
    ActionType, "action" {
        Healthcheck => "HEALTHCHECK",
        Create => "CREATE",
        Update => "UPDATE",
        Retrieve => "RETRIEVE",
        Delete => "DELETE",
        Login => "LOGIN",
        Logout => "LOGOUT",
        Assign => "ASSIGN",
        Remove => "REMOVE",
        Approve => "APPROVE",
        Reject => "REJECT",
        Payment => "PAYMENT",
        QualityCheck => "QUALITY_CHECK",
        BulkUpdate => "BULK_UPDATE",
    }
}

vocabulary! {
    /// Kind of entity an action applies to.
    EntityType, "entity" {
        SystemCheck => "SYSTEM_CHECK",
        Admin => "ADMIN",
        User => "USER",
        Mpc => "MPC",
        Bmc => "BMC",
        Mpp => "MPP",
        Role => "ROLE",
        Order => "ORDER",
        Payment => "PAYMENT",
        Collection => "COLLECTION",
        QualityTest => "QUALITY_TEST",
        Route => "ROUTE",
        Farmer => "FARMER",
        System => "SYSTEM",
    }
}

impl ActionType {
    /// Reads and health checks need not target a specific entity.
    pub fn allows_missing_entity_id(self) -> bool {
        matches!(self, Self::Retrieve | Self::Healthcheck)
    }
}

/// Outcome of the audited operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    #[default]
    Success,
    Failure,
    Pending,
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failure => write!(f, "FAILURE"),
            Self::Pending => write!(f, "PENDING"),
        }
    }
}

/// One changed field between two snapshots.
///
/// A side is `None` when the field was absent from that snapshot, which is
/// distinct from an explicit JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    #[serde(default)]
    pub reason: String,
}

/// Failure information attached to records with status `FAILURE`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorDetails {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: Some(message.into()),
            stack: None,
        }
    }
}

/// A persisted audit record.
///
/// `P` is the representation of the acting principal: the raw id as stored,
/// or an expanded projection in query results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord<P = String> {
    pub id: Uuid,
    pub action: ActionType,
    pub entity: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub performed_by: P,
    /// Absent when no before/after comparison was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<FieldChange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub status: AuditStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<ErrorDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<P> AuditRecord<P> {
    /// Replace the principal representation, keeping every other field.
    pub fn map_performer<Q>(self, f: impl FnOnce(P) -> Q) -> AuditRecord<Q> {
        AuditRecord {
            id: self.id,
            action: self.action,
            entity: self.entity,
            entity_id: self.entity_id,
            performed_by: f(self.performed_by),
            changes: self.changes,
            reason: self.reason,
            metadata: self.metadata,
            status: self.status,
            error_details: self.error_details,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl AuditRecord {
    /// Format the record as a human-readable log line.
    ///
    /// Format: `[timestamp] ACTION ENTITY[:id] by=... status=... [changed_fields=[...]]`
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "[{}] {} {}",
            self.created_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.action,
            self.entity,
        );
        if let Some(ref id) = self.entity_id {
            line.push_str(&format!(":{}", id));
        }
        line.push_str(&format!(" by={} status={}", self.performed_by, self.status));

        if let Some(ref changes) = self.changes
            && !changes.is_empty()
        {
            let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
            line.push_str(&format!(" changed_fields=[{}]", fields.join(",")));
        }
        if let Some(ref reason) = self.reason {
            line.push_str(&format!(" reason=\"{}\"", reason.replace('"', "'")));
        }
        line
    }
}

/// A validated record that has not been persisted yet.
///
/// Stores turn it into an [`AuditRecord`] by assigning the id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRecord {
    pub action: ActionType,
    pub entity: EntityType,
    pub entity_id: Option<String>,
    pub performed_by: String,
    pub changes: Option<Vec<FieldChange>>,
    pub reason: Option<String>,
    pub metadata: Map<String, Value>,
    pub status: AuditStatus,
    pub error_details: Option<ErrorDetails>,
}

impl PendingRecord {
    /// Assign identity and persistence timestamps.
    pub fn into_record(self, persisted_at: DateTime<Utc>) -> AuditRecord {
        AuditRecord {
            id: Uuid::new_v4(),
            action: self.action,
            entity: self.entity,
            entity_id: self.entity_id,
            performed_by: self.performed_by,
            changes: self.changes,
            reason: self.reason,
            metadata: self.metadata,
            status: self.status,
            error_details: self.error_details,
            created_at: persisted_at,
            updated_at: persisted_at,
        }
    }
}

/// Caller-supplied facts for one audit event.
///
/// `action` and `entity` are kept as text until validation so that requests
/// built from untrusted input go through the same checks as typed ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditRequest {
    pub action: String,
    pub entity: String,
    pub entity_id: Option<String>,
    pub performed_by: Option<String>,
    pub old_data: Option<Value>,
    pub new_data: Option<Value>,
    pub metadata: Map<String, Value>,
    pub reason: Option<String>,
    pub status: AuditStatus,
    pub error_details: Option<ErrorDetails>,
}

impl AuditRequest {
    /// Create a builder for an audit request.
    ///
    /// Accepts the typed vocabularies as well as raw strings.
    pub fn builder(action: impl ToString, entity: impl ToString) -> AuditRequestBuilder {
        AuditRequestBuilder {
            request: AuditRequest {
                action: action.to_string(),
                entity: entity.to_string(),
                ..Default::default()
            },
        }
    }
}

/// Builder for [`AuditRequest`].
#[derive(Debug)]
pub struct AuditRequestBuilder {
    request: AuditRequest,
}

impl AuditRequestBuilder {
    /// Set the affected entity's id.
    pub fn entity_id(mut self, id: impl ToString) -> Self {
        self.request.entity_id = Some(id.to_string());
        self
    }

    /// Set the acting principal.
    pub fn performed_by(mut self, principal: impl Into<String>) -> Self {
        self.request.performed_by = Some(principal.into());
        self
    }

    /// Set the state before the operation.
    pub fn old_data(mut self, snapshot: Value) -> Self {
        self.request.old_data = Some(snapshot);
        self
    }

    /// Set the state after the operation.
    pub fn new_data(mut self, snapshot: Value) -> Self {
        self.request.new_data = Some(snapshot);
        self
    }

    /// Merge entries into the metadata bag.
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.request.metadata.extend(metadata);
        self
    }

    /// Set a single metadata entry.
    pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.request.metadata.insert(key.into(), value);
        self
    }

    /// Set the human-readable reason.
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.request.reason = Some(reason.into());
        self
    }

    /// Mark the event as failed with the given details.
    pub fn failed(mut self, details: ErrorDetails) -> Self {
        self.request.status = AuditStatus::Failure;
        self.request.error_details = Some(details);
        self
    }

    /// Set the outcome status.
    pub fn status(mut self, status: AuditStatus) -> Self {
        self.request.status = status;
        self
    }

    /// Build the audit request.
    pub fn build(self) -> AuditRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vocabulary_display_and_parse() {
        for action in ActionType::ALL {
            assert_eq!(action.to_string().parse::<ActionType>().unwrap(), *action);
        }
        for entity in EntityType::ALL {
            assert_eq!(entity.to_string().parse::<EntityType>().unwrap(), *entity);
        }
        assert_eq!(ActionType::ALL.len(), 14);
        assert_eq!(EntityType::ALL.len(), 14);
        assert_eq!(ActionType::QualityCheck.as_str(), "QUALITY_CHECK");
    }

    #[test]
    fn test_unknown_action_message() {
        let err = "FOO".parse::<ActionType>().unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "invalid argument: Invalid action type: FOO");
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(json!(ActionType::BulkUpdate), json!("BULK_UPDATE"));
        assert_eq!(json!(EntityType::SystemCheck), json!("SYSTEM_CHECK"));
        assert_eq!(json!(AuditStatus::default()), json!("SUCCESS"));
    }

    #[test]
    fn test_record_omits_absent_changes() {
        let record = PendingRecord {
            action: ActionType::Create,
            entity: EntityType::User,
            entity_id: Some("u1".to_string()),
            performed_by: SYSTEM_PRINCIPAL.to_string(),
            changes: None,
            reason: None,
            metadata: Map::new(),
            status: AuditStatus::Success,
            error_details: None,
        }
        .into_record(Utc::now());

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("changes").is_none());
        assert!(json.get("errorDetails").is_none());
        assert_eq!(json["performedBy"], "SYSTEM");
        assert_eq!(json["entityId"], "u1");
        assert_eq!(json["createdAt"], json["updatedAt"]);
    }

    #[test]
    fn test_builder() {
        let request = AuditRequest::builder(ActionType::Update, EntityType::Bmc)
            .entity_id("b1")
            .performed_by("u1")
            .old_data(json!({"name": "A"}))
            .new_data(json!({"name": "B"}))
            .meta("userAgent", json!("curl/8"))
            .reason("rename")
            .build();

        assert_eq!(request.action, "UPDATE");
        assert_eq!(request.entity, "BMC");
        assert_eq!(request.entity_id.as_deref(), Some("b1"));
        assert_eq!(request.metadata["userAgent"], "curl/8");
        assert_eq!(request.status, AuditStatus::Success);
    }

    #[test]
    fn test_failed_builder_sets_status() {
        let request = AuditRequest::builder("LOGIN", "USER")
            .failed(ErrorDetails::new("401", "Invalid user credentials"))
            .build();
        assert_eq!(request.status, AuditStatus::Failure);
        assert_eq!(
            request.error_details.unwrap().message.as_deref(),
            Some("Invalid user credentials")
        );
    }

    #[test]
    fn test_to_log_line() {
        let record = PendingRecord {
            action: ActionType::Update,
            entity: EntityType::Mpp,
            entity_id: Some("m1".to_string()),
            performed_by: "u1".to_string(),
            changes: Some(vec![FieldChange {
                field: "name".to_string(),
                old_value: Some(json!("A")),
                new_value: Some(json!("B")),
                reason: "rename".to_string(),
            }]),
            reason: Some("rename".to_string()),
            metadata: Map::new(),
            status: AuditStatus::Success,
            error_details: None,
        }
        .into_record(Utc::now());

        let line = record.to_log_line();
        assert!(line.contains("UPDATE MPP:m1"));
        assert!(line.contains("by=u1"));
        assert!(line.contains("changed_fields=[name]"));
    }
}
