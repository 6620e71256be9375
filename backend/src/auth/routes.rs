//! Defines the HTTP routes for CAS single sign-on.
//!
//! These routes are designed to be nested under `/auth` in the main Axum router.
//! The callback path must match the `service_url` registered for each provider.

use crate::auth::handlers::*;
use crate::auth::middleware::jwt_auth;
use axum::{Router, middleware, routing::get};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/cas/{provider_id}/login", get(cas_login))
        .route("/cas/{provider_id}/callback", get(cas_callback))
        .route("/cas/{provider_id}/logout", get(cas_logout))
        .route("/me", get(me).layer(middleware::from_fn(jwt_auth)))
}
