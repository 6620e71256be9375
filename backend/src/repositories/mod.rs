//! Data access layer.
//!
//! Repositories wrap the SQL for one table each and return `anyhow::Result`,
//! leaving business rules to the service layer.

pub mod provider_repository;
