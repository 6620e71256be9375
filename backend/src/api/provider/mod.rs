//! Module for SSO provider API endpoints.
//!
//! This module handles listing, inspecting and registering the CAS providers
//! users can sign in through.

pub mod handlers;
pub mod routes;
