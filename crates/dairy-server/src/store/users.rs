//! User accounts.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dairy_audit::{PrincipalDirectory, PrincipalProjection};
use dairy_core::models::next_user_code;
use dairy_core::{Role, User};
use serde::Deserialize;
use std::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, Updated, poisoned};

/// Fields of an account to be created. Code, id and timestamps are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub role: Role,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub fh_first_name: Option<String>,
    pub fh_last_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
}

/// Self-service profile changes. Unknown fields are rejected, so role, code
/// and credentials cannot be changed through this path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub fh_first_name: Option<String>,
    pub fh_last_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.fh_first_name.is_none()
            && self.fh_last_name.is_none()
            && self.dob.is_none()
            && self.gender.is_none()
            && self.phone.is_none()
    }

    fn apply(self, user: &mut User) {
        macro_rules! set {
            ($($field:ident),+) => {
                $(if let Some(value) = self.$field {
                    user.$field = Some(value);
                })+
            };
        }
        set!(first_name, last_name, fh_first_name, fh_last_name, dob, gender, phone);
    }
}

#[derive(Default)]
pub struct UserStore {
    users: RwLock<Vec<User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account with the next free user code for its role.
    ///
    /// Emails are compared case-insensitively and stored lower-cased.
    pub fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let email = new.email.trim().to_lowercase();
        let mut users = self.users.write().map_err(poisoned)?;
        if users.iter().any(|u| u.email == email) {
            return Err(StoreError::Duplicate(
                "User with this email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            user_code: next_user_code(new.role, users.iter().map(|u| u.user_code.as_str())),
            role: new.role,
            email,
            first_name: new.first_name,
            last_name: new.last_name,
            fh_first_name: new.fh_first_name,
            fh_last_name: new.fh_last_name,
            dob: new.dob,
            gender: new.gender,
            phone: new.phone,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    pub fn get(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    /// Find the account matching an email or a user code.
    pub fn find_login(
        &self,
        email: Option<&str>,
        user_code: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let email = email.map(|e| e.trim().to_lowercase());
        let users = self.users.read().map_err(poisoned)?;
        Ok(users
            .iter()
            .find(|u| {
                email.as_deref() == Some(u.email.as_str())
                    || user_code == Some(u.user_code.as_str())
            })
            .cloned())
    }

    pub fn update(&self, id: Uuid, update: UserUpdate) -> Result<Option<Updated<User>>, StoreError> {
        let mut users = self.users.write().map_err(poisoned)?;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        let before = user.clone();
        update.apply(user);
        user.updated_at = Utc::now();
        Ok(Some(Updated {
            before,
            after: user.clone(),
        }))
    }

    /// Replace the stored password hash. Returns false for an unknown id.
    pub fn set_password(&self, id: Uuid, password_hash: String) -> Result<bool, StoreError> {
        let mut users = self.users.write().map_err(poisoned)?;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        user.password_hash = password_hash;
        user.updated_at = Utc::now();
        Ok(true)
    }

    pub fn delete(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().map_err(poisoned)?;
        let position = users.iter().position(|u| u.id == id);
        Ok(position.map(|index| users.remove(index)))
    }

    /// Users whose ids are in `ids`, in that order.
    pub fn get_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(ids
            .iter()
            .filter_map(|id| users.iter().find(|u| u.id == *id).cloned())
            .collect())
    }
}

#[async_trait]
impl PrincipalDirectory for UserStore {
    async fn project(&self, principal_id: &str) -> Option<PrincipalProjection> {
        let id = Uuid::parse_str(principal_id).ok()?;
        let user = self.get(id).ok().flatten()?;
        Some(PrincipalProjection {
            id: user.id.to_string(),
            name: user.display_name(),
            email: user.email,
            role: user.role.to_string(),
        })
    }
}
