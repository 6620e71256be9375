//! Module for core business logic services.
//!
//! This module encapsulates services that perform specific business operations,
//! such as registering SSO providers and resolving their CAS configuration.

pub mod provider_service;
