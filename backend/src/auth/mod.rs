//! Authentication module for CAS single sign-on.
//!
//! This module provides the login, callback and logout redirects for CAS
//! providers, the session token middleware, and the `/me` endpoint.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
