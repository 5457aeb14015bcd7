//! # dairy-server
//!
//! HTTP API for the dairy cooperative admin backend.
//!
//! Every state-changing or reading endpoint writes an audit record through
//! [`dairy_audit::AuditLogger`]. Audit writes are best-effort: a failed write
//! is logged and the response is unaffected.
//!
//! ## Routes
//!
//! All routes live under `/api/v1`:
//!
//! | Route | Access |
//! |-------|--------|
//! | `GET /healthcheck`, `POST /auth/register`, `POST /auth/login` | public |
//! | `POST /auth/logout`, `POST /auth/change-password`, `/users/*-account`, `GET /users/current-user` | session |
//! | `POST /users/create-account`, `/bmcs`, `/mpps`, `/mpcs/*`, `/audits` | admin |

pub mod context;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;

pub use context::CallerContext;
pub use error::{ApiError, ServerError};
pub use geo::{DisabledLocator, GeoError, GeoLocation, GeoLocator, IpStackLocator};
pub use response::ApiResponse;
pub use routes::{API_PREFIX, create_router};
pub use server::run;
pub use state::AppState;
