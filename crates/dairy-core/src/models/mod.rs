//! Domain entities of the collection hierarchy.
//!
//! All entities serialize with camelCase field names; these serialized forms
//! are also the snapshots handed to the audit diff engine.

pub mod codes;
pub mod collection;
pub mod user;

use serde::{Deserialize, Serialize};

pub use codes::{next_entity_code, next_user_code, BMC_FIRST_CODE, MPP_FIRST_CODE};
pub use collection::{Bmc, Mpc, MpcCounts, Mpp};
pub use user::{Role, User};

/// Postal address of a collection node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
}

impl Address {
    /// True when no address component is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
