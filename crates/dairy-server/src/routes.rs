//! Route table for the `/api/v1` surface.

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use tower_http::trace::TraceLayer;

use crate::handlers::{audits, auth, bmc, health, mpc, mpp, users};
use crate::middleware::{require_admin, require_session};
use crate::state::AppState;

/// Prefix shared by every route.
pub const API_PREFIX: &str = "/api/v1";

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/users/create-account", post(users::create_account))
        .route("/bmcs", post(bmc::create_bmc).get(bmc::list_bmcs))
        .route(
            "/bmcs/{bmc_code}",
            get(bmc::get_bmc).put(bmc::update_bmc).delete(bmc::delete_bmc),
        )
        .route("/mpps", post(mpp::create_mpp).get(mpp::list_mpps))
        .route(
            "/mpps/{mpp_code}",
            get(mpp::get_mpp).put(mpp::update_mpp).delete(mpp::delete_mpp),
        )
        .route("/mpcs/details", get(mpc::details))
        .route("/mpcs/counts", get(mpc::counts))
        .route("/audits", get(audits::list_audits))
        .route("/audits/{id}", get(audits::get_audit))
        .route_layer(from_fn(require_admin));

    // Layers added later run first, so the session is verified before the
    // admin check.
    let authenticated = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/change-password", post(auth::change_password))
        .route("/users/update-account", put(users::update_account))
        .route("/users/current-user", get(users::current_user))
        .route("/users/delete-account", delete(users::delete_account))
        .merge(admin)
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let public = Router::new()
        .route("/healthcheck", get(health::healthcheck))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    Router::new()
        .nest(API_PREFIX, public.merge(authenticated))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
