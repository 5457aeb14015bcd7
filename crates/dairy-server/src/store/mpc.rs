//! The single MPC aggregate.

use chrono::Utc;
use dairy_core::{Mpc, MpcCounts};
use std::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, poisoned};

/// Which membership list of the MPC an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    Bmc,
    Mpp,
    Farmer,
    Staff,
}

pub struct MpcStore {
    mpc: RwLock<Mpc>,
}

impl Default for MpcStore {
    fn default() -> Self {
        Self {
            mpc: RwLock::new(Mpc::new(Utc::now())),
        }
    }
}

impl MpcStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, member: Member, id: Uuid) -> Result<(), StoreError> {
        let mut mpc = self.mpc.write().map_err(poisoned)?;
        let list = match member {
            Member::Bmc => &mut mpc.bmcs,
            Member::Mpp => &mut mpc.mpps,
            Member::Farmer => &mut mpc.farmers,
            Member::Staff => &mut mpc.staffs,
        };
        if !list.contains(&id) {
            list.push(id);
        }
        mpc.updated_at = Utc::now();
        Ok(())
    }

    /// Remove `id` from every membership list.
    pub fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        let mut mpc = self.mpc.write().map_err(poisoned)?;
        mpc.bmcs.retain(|m| *m != id);
        mpc.mpps.retain(|m| *m != id);
        mpc.farmers.retain(|m| *m != id);
        mpc.staffs.retain(|m| *m != id);
        mpc.updated_at = Utc::now();
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Mpc, StoreError> {
        Ok(self.mpc.read().map_err(poisoned)?.clone())
    }

    pub fn counts(&self) -> Result<MpcCounts, StoreError> {
        Ok(self.mpc.read().map_err(poisoned)?.counts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent_and_remove_clears() {
        let store = MpcStore::new();
        let id = Uuid::new_v4();
        store.add(Member::Farmer, id).unwrap();
        store.add(Member::Farmer, id).unwrap();
        store.add(Member::Bmc, Uuid::new_v4()).unwrap();

        let counts = store.counts().unwrap();
        assert_eq!(counts.total_farmers, 1);
        assert_eq!(counts.total_bmcs, 1);

        store.remove(id).unwrap();
        assert_eq!(store.counts().unwrap().total_farmers, 0);
    }
}
