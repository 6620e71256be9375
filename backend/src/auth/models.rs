//! Data structures for SSO session entities.
//!
//! This module defines the query parameters of the CAS redirect endpoints and
//! the payloads returned once a ticket has been exchanged for a session.

use crate::utils::jwt::Claims;
use serde::{Deserialize, Serialize};

/// Query parameters accepted by the login and logout redirects
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

/// Query parameters CAS appends when redirecting back to the service
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub ticket: String,
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

/// Identity of the signed-in user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub employee_number: String,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub provider_id: String,
    pub role: String,
}

impl From<Claims> for SessionUser {
    fn from(claims: Claims) -> Self {
        Self {
            employee_number: claims.sub,
            username: claims.username,
            name: claims.name,
            email: claims.email,
            provider_id: claims.provider_id,
            role: claims.role,
        }
    }
}

/// Session issued after a successful CAS login
#[derive(Debug, Serialize, Deserialize)]
pub struct CasLoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: SessionUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}
