//! Collection nodes: the MPC aggregate, BMCs and MPPs.

use super::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bulk Milk Chilling center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bmc {
    pub id: Uuid,
    pub bmc_code: String,
    pub name: String,
    #[serde(default)]
    pub address: Address,
    /// User in charge of the center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incharge: Option<Uuid>,
    /// MPPs delivering to this center.
    #[serde(default)]
    pub mpps: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Milk Pooling Point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mpp {
    pub id: Uuid,
    pub mpp_code: String,
    /// Code of the parent BMC.
    pub bmc_code: String,
    pub name: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sahayak: Option<Uuid>,
    #[serde(default)]
    pub farmers: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The cooperative aggregate. There is a single MPC per deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mpc {
    #[serde(default)]
    pub bmcs: Vec<Uuid>,
    #[serde(default)]
    pub mpps: Vec<Uuid>,
    #[serde(default)]
    pub farmers: Vec<Uuid>,
    #[serde(default)]
    pub staffs: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sizes of the MPC member lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MpcCounts {
    #[serde(rename = "totalBMCs")]
    pub total_bmcs: usize,
    #[serde(rename = "totalMPPs")]
    pub total_mpps: usize,
    pub total_farmers: usize,
    pub total_staffs: usize,
}

impl Mpc {
    /// An empty aggregate created at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            bmcs: Vec::new(),
            mpps: Vec::new(),
            farmers: Vec::new(),
            staffs: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn counts(&self) -> MpcCounts {
        MpcCounts {
            total_bmcs: self.bmcs.len(),
            total_mpps: self.mpps.len(),
            total_farmers: self.farmers.len(),
            total_staffs: self.staffs.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut mpc = Mpc::new(Utc::now());
        mpc.bmcs.push(Uuid::new_v4());
        mpc.mpps.extend([Uuid::new_v4(), Uuid::new_v4()]);
        let counts = mpc.counts();
        assert_eq!(counts.total_bmcs, 1);
        assert_eq!(counts.total_mpps, 2);
        assert_eq!(counts.total_farmers, 0);

        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(json["totalBMCs"], 1);
        assert_eq!(json["totalFarmers"], 0);
    }

    #[test]
    fn test_bmc_serializes_camel_case() {
        let now = Utc::now();
        let bmc = Bmc {
            id: Uuid::new_v4(),
            bmc_code: "02001".to_string(),
            name: "Anand North".to_string(),
            address: Address {
                district_name: Some("Anand".to_string()),
                ..Default::default()
            },
            incharge: None,
            mpps: vec![],
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&bmc).unwrap();
        assert_eq!(json["bmcCode"], "02001");
        assert_eq!(json["address"]["districtName"], "Anand");
        assert!(json.get("incharge").is_none());
    }
}
