//! Audit trail queries.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use dairy_audit::query::DEFAULT_LIMIT;
use dairy_audit::{
    AuditError, AuditFilter, AuditPage, AuditRecord, AuditSort, Pagination, parse_action,
    parse_entity,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Query string of `GET /audits`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub entity: Option<String>,
    pub entity_id: Option<String>,
    pub action: Option<String>,
    pub performed_by: Option<String>,
    /// RFC 3339 timestamp, or `YYYY-MM-DD` for the start of that day.
    pub start_date: Option<String>,
    /// RFC 3339 timestamp, or `YYYY-MM-DD` for the end of that day.
    pub end_date: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
}

impl AuditQuery {
    /// Split into the filter, page and sort understood by the audit logger.
    pub fn into_parts(self) -> Result<(AuditFilter, Pagination, AuditSort), AuditError> {
        let filter = AuditFilter {
            entity: self.entity.as_deref().map(parse_entity).transpose()?,
            entity_id: self.entity_id.filter(|id| !id.trim().is_empty()),
            action: self.action.as_deref().map(parse_action).transpose()?,
            performed_by: self.performed_by.filter(|p| !p.trim().is_empty()),
            start_date: parse_date_bound("startDate", self.start_date.as_deref(), NaiveTime::MIN)?,
            end_date: parse_date_bound("endDate", self.end_date.as_deref(), end_of_day())?,
        };
        let pagination = Pagination::new(self.page.unwrap_or(1), self.limit.unwrap_or(DEFAULT_LIMIT));
        let sort = AuditSort::parse(self.sort_field.as_deref(), self.sort_order.as_deref())?;
        Ok((filter, pagination, sort))
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

/// Parse a date filter; a bare calendar date is taken at `time_of_day` UTC.
fn parse_date_bound(
    name: &str,
    raw: Option<&str>,
    time_of_day: NaiveTime,
) -> Result<Option<DateTime<Utc>>, AuditError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| Some(date.and_time(time_of_day).and_utc()))
        .map_err(|_| {
            AuditError::InvalidArgument(format!(
                "{name} must be an RFC 3339 timestamp or a YYYY-MM-DD date"
            ))
        })
}

/// `GET /audits` (admin)
pub async fn list_audits(
    State(state): State<AppState>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<ApiResponse<AuditPage>, ApiError> {
    let Query(query) = query?;
    let (filter, pagination, sort) = query.into_parts()?;
    let page = state.audit().list(filter, pagination, sort).await?;
    Ok(ApiResponse::ok(page, "Audit logs retrieved successfully"))
}

/// `GET /audits/{id}` (admin)
pub async fn get_audit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<AuditRecord>, ApiError> {
    let record = state
        .audit()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Audit log not found"))?;
    Ok(ApiResponse::ok(record, "Audit log retrieved successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dairy_audit::{ActionType, EntityType, SortField, SortOrder};

    #[test]
    fn test_defaults() {
        let (filter, pagination, sort) = AuditQuery::default().into_parts().unwrap();
        assert_eq!(filter, AuditFilter::default());
        assert_eq!(pagination, Pagination::default());
        assert_eq!(sort, AuditSort::default());
    }

    #[test]
    fn test_parses_vocabularies_and_sort() {
        let query = AuditQuery {
            entity: Some("BMC".to_string()),
            action: Some("UPDATE".to_string()),
            entity_id: Some("  ".to_string()),
            sort_field: Some("action".to_string()),
            sort_order: Some("asc".to_string()),
            ..Default::default()
        };
        let (filter, _, sort) = query.into_parts().unwrap();
        assert_eq!(filter.entity, Some(EntityType::Bmc));
        assert_eq!(filter.action, Some(ActionType::Update));
        assert_eq!(filter.entity_id, None);
        assert_eq!(sort, AuditSort::new(SortField::Action, SortOrder::Asc));
    }

    #[test]
    fn test_accepts_plain_dates_as_whole_days() {
        let query = AuditQuery {
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-31".to_string()),
            ..Default::default()
        };
        let (filter, _, _) = query.into_parts().unwrap();
        assert_eq!(
            filter.start_date.map(|d| d.to_rfc3339()).as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
        let end = filter.end_date.unwrap();
        assert_eq!(end.date_naive().to_string(), "2024-01-31");
        assert_eq!(end.format("%H:%M:%S").to_string(), "23:59:59");
    }

    #[test]
    fn test_accepts_timestamps_and_rejects_garbage() {
        let query = AuditQuery {
            start_date: Some("2024-01-01T10:00:00+05:30".to_string()),
            end_date: Some(" ".to_string()),
            ..Default::default()
        };
        let (filter, _, _) = query.into_parts().unwrap();
        assert_eq!(
            filter.start_date.map(|d| d.to_rfc3339()).as_deref(),
            Some("2024-01-01T04:30:00+00:00")
        );
        assert_eq!(filter.end_date, None);

        let query = AuditQuery {
            end_date: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(query.into_parts().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_rejects_unknown_vocabulary() {
        let query = AuditQuery {
            action: Some("FOO".to_string()),
            ..Default::default()
        };
        assert!(query.into_parts().unwrap_err().is_invalid_argument());

        let query = AuditQuery {
            sort_field: Some("bogus".to_string()),
            ..Default::default()
        };
        assert!(query.into_parts().is_err());
    }
}
