//! Query types for reading the audit trail.

use crate::error::AuditError;
use crate::record::{ActionType, AuditRecord, EntityType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Default page size for audit listings.
pub const DEFAULT_LIMIT: usize = 25;

/// Filter for querying audit records. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditFilter {
    pub entity: Option<EntityType>,
    pub entity_id: Option<String>,
    pub action: Option<ActionType>,
    pub performed_by: Option<String>,
    /// Inclusive lower bound on `createdAt`.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `createdAt`.
    pub end_date: Option<DateTime<Utc>>,
}

impl AuditFilter {
    pub fn validate(&self) -> Result<(), AuditError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && start > end
        {
            return Err(AuditError::invalid("startDate must not be after endDate"));
        }
        Ok(())
    }

    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(entity) = self.entity
            && record.entity != entity
        {
            return false;
        }
        if let Some(ref entity_id) = self.entity_id
            && record.entity_id.as_ref() != Some(entity_id)
        {
            return false;
        }
        if let Some(action) = self.action
            && record.action != action
        {
            return false;
        }
        if let Some(ref performed_by) = self.performed_by
            && &record.performed_by != performed_by
        {
            return false;
        }
        if let Some(start) = self.start_date
            && record.created_at < start
        {
            return false;
        }
        if let Some(end) = self.end_date
            && record.created_at > end
        {
            return false;
        }
        true
    }
}

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(page: usize, limit: usize) -> Self {
        Self { page, limit }
    }

    pub fn validate(&self) -> Result<(), AuditError> {
        if self.page < 1 {
            return Err(AuditError::invalid("page must be at least 1"));
        }
        if self.limit < 1 {
            return Err(AuditError::invalid("limit must be at least 1"));
        }
        Ok(())
    }

    /// Number of records to skip.
    pub fn offset(&self) -> Result<usize, AuditError> {
        (self.page - 1)
            .checked_mul(self.limit)
            .ok_or_else(|| AuditError::invalid("page is out of range"))
    }
}

/// Field an audit listing can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Action,
    Entity,
    EntityId,
    PerformedBy,
    Status,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
            Self::Action => "action",
            Self::Entity => "entity",
            Self::EntityId => "entityId",
            Self::PerformedBy => "performedBy",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(Self::CreatedAt),
            "updatedAt" => Ok(Self::UpdatedAt),
            "action" => Ok(Self::Action),
            "entity" => Ok(Self::Entity),
            "entityId" => Ok(Self::EntityId),
            "performedBy" => Ok(Self::PerformedBy),
            "status" => Ok(Self::Status),
            other => Err(AuditError::invalid(format!("unsupported sort field: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(AuditError::invalid(format!(
                "sort order must be asc or desc, got {}",
                other
            ))),
        }
    }
}

/// Sort field and direction. Defaults to newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl AuditSort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Parse optional field and order strings, defaulting missing parts.
    pub fn parse(field: Option<&str>, order: Option<&str>) -> Result<Self, AuditError> {
        Ok(Self {
            field: field.map(str::parse::<SortField>).transpose()?.unwrap_or_default(),
            order: order.map(str::parse::<SortOrder>).transpose()?.unwrap_or_default(),
        })
    }

    /// Compare two records under this sort.
    pub fn compare(&self, a: &AuditRecord, b: &AuditRecord) -> Ordering {
        let ordering = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Action => a.action.as_str().cmp(b.action.as_str()),
            SortField::Entity => a.entity.as_str().cmp(b.entity.as_str()),
            SortField::EntityId => a.entity_id.cmp(&b.entity_id),
            SortField::PerformedBy => a.performed_by.cmp(&b.performed_by),
            SortField::Status => a.status.to_string().cmp(&b.status.to_string()),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Expanded view of the principal who performed an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalProjection {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// `performedBy` in query results: a projection when the principal is known,
/// the raw stored id otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerformedBy {
    Principal(PrincipalProjection),
    Id(String),
}

impl PerformedBy {
    pub fn id(&self) -> &str {
        match self {
            Self::Principal(p) => &p.id,
            Self::Id(id) => id,
        }
    }
}

/// Looks up principals for `performedBy` projection.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Project a principal id, or `None` if it is unknown.
    async fn project(&self, principal_id: &str) -> Option<PrincipalProjection>;
}

/// Audit record as returned by the query service.
pub type AuditRecordView = AuditRecord<PerformedBy>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub page_count: usize,
}

impl PageInfo {
    pub fn new(total: usize, pagination: Pagination) -> Self {
        Self {
            total,
            page: pagination.page,
            limit: pagination.limit,
            page_count: total.div_ceil(pagination.limit),
        }
    }
}

/// One page of audit records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditPage {
    pub records: Vec<AuditRecordView>,
    pub page_info: PageInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AuditStatus, PendingRecord};
    use chrono::Duration;
    use serde_json::{Map, json};

    fn record(action: ActionType, performed_by: &str, at: DateTime<Utc>) -> AuditRecord {
        PendingRecord {
            action,
            entity: EntityType::Bmc,
            entity_id: Some("b1".to_string()),
            performed_by: performed_by.to_string(),
            changes: None,
            reason: None,
            metadata: Map::new(),
            status: AuditStatus::Success,
            error_details: None,
        }
        .into_record(at)
    }

    #[test]
    fn test_filter_matches_conjunction() {
        let now = Utc::now();
        let r = record(ActionType::Update, "u1", now);

        assert!(AuditFilter::default().matches(&r));
        let filter = AuditFilter {
            entity: Some(EntityType::Bmc),
            action: Some(ActionType::Update),
            performed_by: Some("u1".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&r));

        let filter = AuditFilter {
            action: Some(ActionType::Update),
            performed_by: Some("u2".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&r));
    }

    #[test]
    fn test_filter_date_bounds_inclusive() {
        let now = Utc::now();
        let r = record(ActionType::Create, "u1", now);
        let filter = AuditFilter {
            start_date: Some(now),
            end_date: Some(now),
            ..Default::default()
        };
        assert!(filter.matches(&r));

        let later = AuditFilter {
            start_date: Some(now + Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!later.matches(&r));
    }

    #[test]
    fn test_filter_rejects_inverted_range() {
        let now = Utc::now();
        let filter = AuditFilter {
            start_date: Some(now),
            end_date: Some(now - Duration::days(1)),
            ..Default::default()
        };
        assert!(filter.validate().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_pagination() {
        assert_eq!(Pagination::default(), Pagination::new(1, 25));
        assert_eq!(Pagination::new(3, 25).offset().unwrap(), 50);
        assert!(Pagination::new(0, 25).validate().unwrap_err().to_string().contains("page"));
        assert!(Pagination::new(1, 0).validate().unwrap_err().to_string().contains("limit"));
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(AuditSort::parse(None, None).unwrap(), AuditSort::default());
        let sort = AuditSort::parse(Some("entityId"), Some("asc")).unwrap();
        assert_eq!(sort, AuditSort::new(SortField::EntityId, SortOrder::Asc));
        assert!(AuditSort::parse(Some("password"), None).is_err());
        assert!(AuditSort::parse(None, Some("sideways")).is_err());
    }

    #[test]
    fn test_sort_compare() {
        let now = Utc::now();
        let older = record(ActionType::Update, "u1", now - Duration::minutes(1));
        let newer = record(ActionType::Create, "u2", now);

        assert_eq!(AuditSort::default().compare(&newer, &older), Ordering::Less);
        let by_action = AuditSort::new(SortField::Action, SortOrder::Asc);
        assert_eq!(by_action.compare(&newer, &older), Ordering::Less);
    }

    #[test]
    fn test_page_info_count() {
        assert_eq!(PageInfo::new(60, Pagination::default()).page_count, 3);
        assert_eq!(PageInfo::new(50, Pagination::default()).page_count, 2);
        assert_eq!(PageInfo::new(0, Pagination::default()).page_count, 0);
        let json = serde_json::to_value(PageInfo::new(1, Pagination::default())).unwrap();
        assert_eq!(json["pageCount"], 1);
    }

    #[test]
    fn test_performed_by_serializes_untagged() {
        let raw = PerformedBy::Id("SYSTEM".to_string());
        assert_eq!(serde_json::to_value(&raw).unwrap(), json!("SYSTEM"));

        let projected = PerformedBy::Principal(PrincipalProjection {
            id: "u1".to_string(),
            name: "Asha Shah".to_string(),
            email: "asha@example.com".to_string(),
            role: "admin".to_string(),
        });
        let value = serde_json::to_value(&projected).unwrap();
        assert_eq!(value["email"], "asha@example.com");
        assert_eq!(projected.id(), "u1");
    }
}
