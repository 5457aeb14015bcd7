//! Request middleware.

pub mod auth;

pub use auth::{ACCESS_TOKEN_COOKIE, Session, extract_token, require_admin, require_session};
