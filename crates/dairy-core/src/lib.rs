//! # dairy-core
//!
//! Configuration types and domain models shared by the dairy admin crates.
//!
//! The collection hierarchy is:
//!
//! ```text
//! MPC (cooperative aggregate)
//!  └── BMC (bulk milk chilling center)
//!       └── MPP (milk pooling point)
//!            └── farmers / sahayaks
//! ```

// Configuration types shared across all dairy crates
pub mod config;

// Domain entities managed by the admin API
pub mod models;

pub use config::{
    AuditConfig, AuthConfig, ConfigError, DairyConfig, GeoConfig, LoggingConfig, ServerConfig,
    StorageBackend,
};
pub use models::{Address, Bmc, Mpc, MpcCounts, Mpp, Role, User};
