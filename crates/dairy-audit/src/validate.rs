//! Checks applied to every candidate record before it is written.

use crate::error::AuditError;
use crate::record::{ActionType, AuditRequest, EntityType, LEGACY_SYSTEM_ENTITY};

/// Fields of an [`AuditRequest`] after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub action: ActionType,
    pub entity: EntityType,
    /// Trimmed entity id, `None` when absent or blank.
    pub entity_id: Option<String>,
}

/// Parse an action string against the action vocabulary.
pub fn parse_action(value: &str) -> Result<ActionType, AuditError> {
    value.parse()
}

/// Parse an entity string against the entity vocabulary.
///
/// The literal `SYSTEM` is always accepted.
pub fn parse_entity(value: &str) -> Result<EntityType, AuditError> {
    if value == LEGACY_SYSTEM_ENTITY {
        return Ok(EntityType::System);
    }
    value.parse()
}

/// Validate a candidate audit record.
///
/// Rejects unknown actions and entities, and a missing entity id for actions
/// that target a specific entity.
pub fn validate(request: &AuditRequest) -> Result<ValidatedRequest, AuditError> {
    let action = parse_action(&request.action)?;
    let entity = parse_entity(&request.entity)?;

    let entity_id = request
        .entity_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    if entity_id.is_none() && !action.allows_missing_entity_id() {
        return Err(AuditError::invalid(format!(
            "entityId is required for {} on {}",
            action, entity
        )));
    }

    Ok(ValidatedRequest {
        action,
        entity,
        entity_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        assert_eq!(parse_action("UPDATE").unwrap(), ActionType::Update);
        let err = parse_action("FOO").unwrap_err();
        assert!(err.to_string().contains("Invalid action type: FOO"));
        // Case matters
        assert!(parse_action("update").is_err());
    }

    #[test]
    fn test_parse_entity_accepts_system_literal() {
        assert_eq!(parse_entity("SYSTEM").unwrap(), EntityType::System);
        assert_eq!(parse_entity("MPP").unwrap(), EntityType::Mpp);
        let err = parse_entity("WIDGET").unwrap_err();
        assert!(err.to_string().contains("Invalid entity type: WIDGET"));
    }

    #[test]
    fn test_validate_requires_entity_id_for_mutations() {
        let request = AuditRequest::builder("UPDATE", "BMC").build();
        let err = validate(&request).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("entityId"));

        let blank = AuditRequest::builder("DELETE", "USER").entity_id("   ").build();
        assert!(validate(&blank).is_err());
    }

    #[test]
    fn test_validate_allows_missing_entity_id_for_reads() {
        let retrieve = AuditRequest::builder("RETRIEVE", "BMC").build();
        assert_eq!(validate(&retrieve).unwrap().entity_id, None);

        let health = AuditRequest::builder("HEALTHCHECK", "SYSTEM_CHECK").build();
        assert!(validate(&health).is_ok());
    }

    #[test]
    fn test_validate_trims_entity_id() {
        let request = AuditRequest::builder(ActionType::Create, EntityType::Farmer)
            .entity_id(" f1 ")
            .build();
        let validated = validate(&request).unwrap();
        assert_eq!(validated.entity, EntityType::Farmer);
        assert_eq!(validated.entity_id.as_deref(), Some("f1"));
    }

    #[test]
    fn test_validate_checks_action_before_entity() {
        let request = AuditRequest::builder("FOO", "WIDGET").entity_id("x").build();
        assert!(validate(&request).unwrap_err().to_string().contains("action"));
    }
}
