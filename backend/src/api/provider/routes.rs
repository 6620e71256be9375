//! Defines the HTTP routes for SSO provider management.
//!
//! Every route requires a session token; registering and deleting providers
//! additionally requires the admin role.

use super::handlers::{create_provider, delete_provider, get_provider, list_providers};
use crate::auth::middleware::{admin_auth, jwt_auth};
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

pub fn provider_router() -> Router {
    Router::new()
        .route("/", get(list_providers).layer(middleware::from_fn(jwt_auth)))
        .route(
            "/",
            post(create_provider)
                .layer(middleware::from_fn(admin_auth))
                .layer(middleware::from_fn(jwt_auth)),
        )
        .route(
            "/{id}",
            get(get_provider).layer(middleware::from_fn(jwt_auth)),
        )
        .route(
            "/{id}",
            delete(delete_provider)
                .layer(middleware::from_fn(admin_auth))
                .layer(middleware::from_fn(jwt_auth)),
        )
}
