//! Central module for organizing the application's API endpoints.
//!
//! This module holds the SSO provider management endpoints and the shared
//! response helpers. The CAS login routes live in `auth`.

pub mod common;
pub mod provider;
