//! BMC and MPP collection nodes.

use chrono::Utc;
use dairy_core::models::{BMC_FIRST_CODE, MPP_FIRST_CODE, next_entity_code};
use dairy_core::{Address, Bmc, Mpp};
use serde::Deserialize;
use std::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, Updated, poisoned};

/// Request body for a new BMC. The code is assigned by the store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBmc {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub incharge: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BmcUpdate {
    pub name: Option<String>,
    pub address: Option<Address>,
    pub incharge: Option<Uuid>,
}

impl BmcUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.incharge.is_none()
    }
}

/// Request body for a new MPP. The code is assigned by the store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMpp {
    #[serde(default)]
    pub bmc_code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub sahayak: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MppUpdate {
    pub name: Option<String>,
    pub address: Option<Address>,
    pub sahayak: Option<Uuid>,
}

impl MppUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.sahayak.is_none()
    }
}

#[derive(Default)]
pub struct BmcStore {
    bmcs: RwLock<Vec<Bmc>>,
}

impl BmcStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, new: NewBmc) -> Result<Bmc, StoreError> {
        let mut bmcs = self.bmcs.write().map_err(poisoned)?;
        let now = Utc::now();
        let bmc = Bmc {
            id: Uuid::new_v4(),
            bmc_code: next_entity_code(bmcs.iter().map(|b| b.bmc_code.as_str()), BMC_FIRST_CODE),
            name: new.name.trim().to_string(),
            address: new.address,
            incharge: new.incharge,
            mpps: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        bmcs.push(bmc.clone());
        Ok(bmc)
    }

    pub fn list(&self) -> Result<Vec<Bmc>, StoreError> {
        Ok(self.bmcs.read().map_err(poisoned)?.clone())
    }

    pub fn get(&self, code: &str) -> Result<Option<Bmc>, StoreError> {
        let bmcs = self.bmcs.read().map_err(poisoned)?;
        Ok(bmcs.iter().find(|b| b.bmc_code == code).cloned())
    }

    pub fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Bmc>, StoreError> {
        let bmcs = self.bmcs.read().map_err(poisoned)?;
        Ok(ids
            .iter()
            .filter_map(|id| bmcs.iter().find(|b| b.id == *id).cloned())
            .collect())
    }

    pub fn update(&self, code: &str, update: BmcUpdate) -> Result<Option<Updated<Bmc>>, StoreError> {
        let mut bmcs = self.bmcs.write().map_err(poisoned)?;
        let Some(bmc) = bmcs.iter_mut().find(|b| b.bmc_code == code) else {
            return Ok(None);
        };
        let before = bmc.clone();
        if let Some(name) = update.name {
            bmc.name = name.trim().to_string();
        }
        if let Some(address) = update.address {
            bmc.address = address;
        }
        if let Some(incharge) = update.incharge {
            bmc.incharge = Some(incharge);
        }
        bmc.updated_at = Utc::now();
        Ok(Some(Updated {
            before,
            after: bmc.clone(),
        }))
    }

    pub fn delete(&self, code: &str) -> Result<Option<Bmc>, StoreError> {
        let mut bmcs = self.bmcs.write().map_err(poisoned)?;
        let position = bmcs.iter().position(|b| b.bmc_code == code);
        Ok(position.map(|index| bmcs.remove(index)))
    }

    /// Register an MPP under a BMC. Returns false if the BMC does not exist.
    pub fn attach_mpp(&self, code: &str, mpp_id: Uuid) -> Result<bool, StoreError> {
        let mut bmcs = self.bmcs.write().map_err(poisoned)?;
        let Some(bmc) = bmcs.iter_mut().find(|b| b.bmc_code == code) else {
            return Ok(false);
        };
        if !bmc.mpps.contains(&mpp_id) {
            bmc.mpps.push(mpp_id);
            bmc.updated_at = Utc::now();
        }
        Ok(true)
    }

    pub fn detach_mpp(&self, code: &str, mpp_id: Uuid) -> Result<(), StoreError> {
        let mut bmcs = self.bmcs.write().map_err(poisoned)?;
        if let Some(bmc) = bmcs.iter_mut().find(|b| b.bmc_code == code) {
            bmc.mpps.retain(|id| *id != mpp_id);
            bmc.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MppStore {
    mpps: RwLock<Vec<Mpp>>,
}

impl MppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, new: NewMpp) -> Result<Mpp, StoreError> {
        let mut mpps = self.mpps.write().map_err(poisoned)?;
        let now = Utc::now();
        let mpp = Mpp {
            id: Uuid::new_v4(),
            mpp_code: next_entity_code(mpps.iter().map(|m| m.mpp_code.as_str()), MPP_FIRST_CODE),
            bmc_code: new.bmc_code.trim().to_string(),
            name: new.name.trim().to_string(),
            address: new.address,
            sahayak: new.sahayak,
            farmers: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        mpps.push(mpp.clone());
        Ok(mpp)
    }

    pub fn list(&self) -> Result<Vec<Mpp>, StoreError> {
        Ok(self.mpps.read().map_err(poisoned)?.clone())
    }

    pub fn get(&self, code: &str) -> Result<Option<Mpp>, StoreError> {
        let mpps = self.mpps.read().map_err(poisoned)?;
        Ok(mpps.iter().find(|m| m.mpp_code == code).cloned())
    }

    pub fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Mpp>, StoreError> {
        let mpps = self.mpps.read().map_err(poisoned)?;
        Ok(ids
            .iter()
            .filter_map(|id| mpps.iter().find(|m| m.id == *id).cloned())
            .collect())
    }

    pub fn update(&self, code: &str, update: MppUpdate) -> Result<Option<Updated<Mpp>>, StoreError> {
        let mut mpps = self.mpps.write().map_err(poisoned)?;
        let Some(mpp) = mpps.iter_mut().find(|m| m.mpp_code == code) else {
            return Ok(None);
        };
        let before = mpp.clone();
        if let Some(name) = update.name {
            mpp.name = name.trim().to_string();
        }
        if let Some(address) = update.address {
            mpp.address = address;
        }
        if let Some(sahayak) = update.sahayak {
            mpp.sahayak = Some(sahayak);
        }
        mpp.updated_at = Utc::now();
        Ok(Some(Updated {
            before,
            after: mpp.clone(),
        }))
    }

    pub fn delete(&self, code: &str) -> Result<Option<Mpp>, StoreError> {
        let mut mpps = self.mpps.write().map_err(poisoned)?;
        let position = mpps.iter().position(|m| m.mpp_code == code);
        Ok(position.map(|index| mpps.remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_bmc(name: &str) -> NewBmc {
        NewBmc {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_bmc_codes_are_sequential() {
        let store = BmcStore::new();
        assert_eq!(store.create(new_bmc("A")).unwrap().bmc_code, "02001");
        assert_eq!(store.create(new_bmc("B")).unwrap().bmc_code, "02002");
    }

    #[test]
    fn test_bmc_update_and_delete() {
        let store = BmcStore::new();
        store.create(new_bmc("Anand North")).unwrap();

        let updated = store
            .update(
                "02001",
                BmcUpdate {
                    name: Some("Anand Central".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.before.name, "Anand North");
        assert_eq!(updated.after.name, "Anand Central");

        assert!(store.update("09999", BmcUpdate::default()).unwrap().is_none());
        assert!(store.delete("02001").unwrap().is_some());
        assert!(store.get("02001").unwrap().is_none());
    }

    #[test]
    fn test_attach_and_detach_mpp() {
        let store = BmcStore::new();
        store.create(new_bmc("A")).unwrap();
        let mpp_id = Uuid::new_v4();

        assert!(store.attach_mpp("02001", mpp_id).unwrap());
        assert!(store.attach_mpp("02001", mpp_id).unwrap());
        assert_eq!(store.get("02001").unwrap().unwrap().mpps, vec![mpp_id]);
        assert!(!store.attach_mpp("02002", mpp_id).unwrap());

        store.detach_mpp("02001", mpp_id).unwrap();
        assert!(store.get("02001").unwrap().unwrap().mpps.is_empty());
    }

    #[test]
    fn test_mpp_codes_start_at_05001() {
        let store = MppStore::new();
        let mpp = store
            .create(NewMpp {
                bmc_code: "02001".to_string(),
                name: "Village 1".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(mpp.mpp_code, "05001");
        assert_eq!(mpp.bmc_code, "02001");
    }

    #[test]
    fn test_update_rejects_code_change() {
        assert!(serde_json::from_str::<BmcUpdate>(r#"{"bmcCode": "02999"}"#).is_err());
        assert!(serde_json::from_str::<MppUpdate>(r#"{"bmcCode": "02999"}"#).is_err());
    }
}
