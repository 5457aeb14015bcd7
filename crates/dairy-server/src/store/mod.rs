//! In-process stores for the cooperative's domain entities.
//!
//! Each store guards its data with a `std::sync::RwLock` that is never held
//! across an `.await`. Mutations return before/after snapshots so handlers can
//! hand them to the audit writer.

pub mod collection;
pub mod mpc;
pub mod users;

use thiserror::Error;

pub use collection::{BmcStore, BmcUpdate, MppStore, MppUpdate, NewBmc, NewMpp};
pub use mpc::{Member, MpcStore};
pub use users::{NewUser, UserStore, UserUpdate};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field is already taken.
    #[error("{0}")]
    Duplicate(String),

    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

pub(crate) fn poisoned(e: impl std::fmt::Display) -> StoreError {
    StoreError::Poisoned(e.to_string())
}

/// Result of an update: the entity before and after the change.
#[derive(Debug, Clone)]
pub struct Updated<T> {
    pub before: T,
    pub after: T,
}
