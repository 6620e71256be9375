//! Outcome types produced by ticket validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a ticket could not be turned into an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Ticket or service was empty; nothing was sent to the CAS server.
    MissingInput,
    /// The validation URL could not be built from the provider settings.
    Configuration { message: String },
    /// Transport failure or timeout.
    Network { message: String },
    /// The CAS server answered with a non-2xx status.
    HttpStatus { status: u16, reason: String },
    /// The CAS server rejected the ticket.
    CasAuth { code: String, message: String },
    /// The body was not a recognizable CAS service response.
    Parse { message: String },
}

impl ValidationFailure {
    /// Short machine-readable category, used in logs and API error types.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationFailure::MissingInput => "missing_input",
            ValidationFailure::Configuration { .. } => "configuration_error",
            ValidationFailure::Network { .. } => "network_error",
            ValidationFailure::HttpStatus { .. } => "http_status_error",
            ValidationFailure::CasAuth { .. } => "cas_authentication_failure",
            ValidationFailure::Parse { .. } => "parse_error",
        }
    }

    /// Flattens the failure into the loose `attributes` map callers expect.
    pub fn into_attributes(self) -> BTreeMap<String, String> {
        let mut attributes = BTreeMap::new();
        match self {
            ValidationFailure::MissingInput => {}
            ValidationFailure::Configuration { message } | ValidationFailure::Network { message } => {
                attributes.insert("error".to_string(), message);
            }
            ValidationFailure::HttpStatus { status, reason } => {
                attributes.insert("error".to_string(), format!("HTTP {}: {}", status, reason));
            }
            ValidationFailure::CasAuth { code, message } => {
                attributes.insert("error_code".to_string(), code);
                attributes.insert("error_message".to_string(), message);
            }
            ValidationFailure::Parse { message } => {
                attributes.insert("parse_error".to_string(), message);
            }
        }
        attributes
    }
}

/// Identity extracted from a successful CAS response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasIdentity {
    pub employee_number: String,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

/// Typed outcome of a validation call plus the raw CAS body, if one arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub result: Result<CasIdentity, ValidationFailure>,
    pub raw_response: Option<String>,
}

impl ValidationOutcome {
    pub fn failed(failure: ValidationFailure) -> Self {
        Self {
            result: Err(failure),
            raw_response: None,
        }
    }

    /// Flattens the outcome into the loose wire shape.
    pub fn into_result(self) -> ValidationResult {
        match self.result {
            Ok(identity) => {
                ValidationResult::authenticated(identity, self.raw_response.unwrap_or_default())
            }
            Err(failure) => ValidationResult::failed(failure, self.raw_response),
        }
    }
}

/// Result of one validation call, in the shape route handlers hand to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub success: bool,
    pub employee_number: String,
    pub username: String,
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl ValidationResult {
    pub fn authenticated(identity: CasIdentity, raw_response: String) -> Self {
        Self {
            success: true,
            employee_number: identity.employee_number,
            username: identity.username,
            attributes: identity.attributes,
            raw_response: Some(raw_response),
        }
    }

    pub fn failed(failure: ValidationFailure, raw_response: Option<String>) -> Self {
        Self {
            success: false,
            employee_number: String::new(),
            username: String::new(),
            attributes: failure.into_attributes(),
            raw_response,
        }
    }

    /// Reason reported for a failed validation, if the failure carries one.
    pub fn error_message(&self) -> Option<&str> {
        if self.success {
            return None;
        }
        ["error_message", "error", "parse_error"]
            .iter()
            .find_map(|key| self.attributes.get(*key))
            .map(String::as_str)
    }
}
