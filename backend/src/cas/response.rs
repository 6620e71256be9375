//! Interpretation of CAS `serviceResponse` documents (protocol 2.0 and 3.0).

use crate::cas::attributes::{CasAttributes, IdentityField, extract_attribute};
use crate::cas::config::AttributeMapping;
use crate::cas::result::{CasIdentity, ValidationFailure, ValidationOutcome, ValidationResult};
use crate::cas::xml::{XmlElement, parse_document};
use tracing::debug;

const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";

/// Turns a raw CAS validation body into a `ValidationResult`.
///
/// The raw body is always echoed back in `raw_response` for diagnostics.
pub fn parse_service_response(xml: &str, mapping: &AttributeMapping) -> ValidationResult {
    ValidationOutcome {
        result: parse_identity(xml, mapping),
        raw_response: Some(xml.to_string()),
    }
    .into_result()
}

/// Reads the identity out of a CAS body, or the reason there is none.
pub fn parse_identity(xml: &str, mapping: &AttributeMapping) -> Result<CasIdentity, ValidationFailure> {
    let root = parse_document(xml).map_err(|e| ValidationFailure::Parse {
        message: e.to_string(),
    })?;

    if root.local_name() != "serviceResponse" {
        return Err(ValidationFailure::Parse {
            message: format!("expected serviceResponse root element, found <{}>", root.name),
        });
    }

    if let Some(success) = root.child("authenticationSuccess") {
        return Ok(extract_identity(success, mapping));
    }

    if let Some(failure) = root.child("authenticationFailure") {
        return Err(ValidationFailure::CasAuth {
            code: failure
                .attribute("code")
                .filter(|code| !code.is_empty())
                .unwrap_or(UNKNOWN_ERROR)
                .to_string(),
            message: failure.text().to_string(),
        });
    }

    Err(ValidationFailure::Parse {
        message: "serviceResponse contains neither authenticationSuccess nor authenticationFailure"
            .to_string(),
    })
}

/// Builds the identity from an `authenticationSuccess` element.
///
/// Employee number and username fall back to the `<cas:user>` value and the
/// full name falls back to an empty string when the mapped attribute is absent.
pub fn extract_identity(success: &XmlElement, mapping: &AttributeMapping) -> CasIdentity {
    let user = success
        .child("user")
        .map(|user| user.text().to_string())
        .unwrap_or_default();
    let attributes = CasAttributes::from_element(success.child("attributes"));
    if attributes.is_empty() {
        debug!("CAS success response for '{}' carries no attributes", user);
    }

    let lookup = |field| extract_attribute(&attributes, field, mapping).map(str::to_string);

    let employee_number = lookup(IdentityField::EmployeeId).unwrap_or_else(|| user.clone());
    let username = lookup(IdentityField::Username).unwrap_or_else(|| user.clone());
    let full_name = lookup(IdentityField::FullName).unwrap_or_default();
    let email = lookup(IdentityField::Email);

    let mut flattened = std::collections::BTreeMap::new();
    flattened.insert("name".to_string(), full_name.clone());
    flattened.insert("username".to_string(), username.clone());
    flattened.extend(attributes.flatten());

    CasIdentity {
        employee_number,
        username,
        full_name,
        email,
        attributes: flattened,
    }
}
