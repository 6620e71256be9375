//! CAS (Central Authentication Service) client.
//!
//! Builds login/logout redirects, validates service tickets against the CAS
//! server and turns its XML answer into a normalized identity.

pub mod attributes;
pub mod config;
pub mod response;
pub mod result;
pub mod urls;
pub mod validator;
pub mod xml;

pub use config::{CasConfigError, CasSettings, ProviderConfig};
pub use result::{CasIdentity, ValidationResult};
pub use validator::TicketValidator;
