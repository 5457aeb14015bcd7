//! User accounts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Cooperative administrator.
    Admin,
    /// Milk supplier attached to an MPP.
    Farmer,
    /// MPP operator.
    Sahayak,
    /// BMC in-charge.
    Incharge,
}

impl Role {
    /// Roles an administrator may create through the user API.
    pub const CREATABLE: [Role; 3] = [Role::Farmer, Role::Sahayak, Role::Incharge];

    /// Upper-case initial used for user codes.
    pub fn code_prefix(self) -> char {
        match self {
            Self::Admin => 'A',
            Self::Farmer => 'F',
            Self::Sahayak => 'S',
            Self::Incharge => 'I',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Farmer => "farmer",
            Self::Sahayak => "sahayak",
            Self::Incharge => "incharge",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "farmer" => Ok(Self::Farmer),
            "sahayak" => Ok(Self::Sahayak),
            "incharge" => Ok(Self::Incharge),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A user account.
///
/// The password hash is never serialized, so a serialized `User` is safe to
/// return to clients and to store as an audit snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub user_code: String,
    pub role: Role,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Father's or husband's first name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fh_first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fh_last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name shown in listings: "First Last", falling back to the email.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if parts.is_empty() {
            self.email.clone()
        } else {
            parts.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            user_code: "F001".to_string(),
            role: Role::Farmer,
            email: "ravi@example.com".to_string(),
            first_name: Some("Ravi".to_string()),
            last_name: Some("Patel".to_string()),
            fh_first_name: None,
            fh_last_name: None,
            dob: None,
            gender: None,
            phone: None,
            password_hash: "$argon2id$secret".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["userCode"], "F001");
        assert_eq!(json["role"], "farmer");
    }

    #[test]
    fn test_display_name() {
        let mut u = user();
        assert_eq!(u.display_name(), "Ravi Patel");
        u.first_name = None;
        u.last_name = None;
        assert_eq!(u.display_name(), "ravi@example.com");
    }

    #[test]
    fn test_role_round_trip_from_str() {
        for role in [Role::Admin, Role::Farmer, Role::Sahayak, Role::Incharge] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("owner".parse::<Role>().is_err());
    }
}
