//! Exchanges CAS service tickets for identities.

use crate::cas::config::ProviderConfig;
use crate::cas::response::parse_identity;
use crate::cas::result::{ValidationFailure, ValidationOutcome, ValidationResult};
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Validates tickets against one CAS provider.
///
/// Every failure is reported through the returned `ValidationResult`; a
/// failed validation is final for that ticket and is never retried here.
#[derive(Clone)]
pub struct TicketValidator {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl TicketValidator {
    pub fn new(config: ProviderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Full validation URL for a ticket/service pair.
    pub fn validation_url(&self, ticket: &str, service: &str) -> Result<Url, ValidationFailure> {
        let endpoint = format!(
            "{}{}",
            self.config.base_url,
            self.config.validation_endpoint()
        );
        Url::parse_with_params(&endpoint, &[("service", service), ("ticket", ticket)]).map_err(
            |e| ValidationFailure::Configuration {
                message: format!("Invalid validation URL '{}': {}", endpoint, e),
            },
        )
    }

    /// Validates `ticket` for `service`, which must be the exact service
    /// string used when the login redirect was issued.
    pub async fn validate(&self, ticket: &str, service: &str) -> ValidationOutcome {
        if ticket.is_empty() || service.is_empty() {
            debug!("Skipping CAS validation: ticket or service is empty");
            return ValidationOutcome::failed(ValidationFailure::MissingInput);
        }

        let body = match self.fetch(ticket, service).await {
            Ok(body) => body,
            Err(failure) => {
                warn!("CAS ticket validation failed ({})", failure.kind());
                return ValidationOutcome::failed(failure);
            }
        };

        let result = parse_identity(&body, &self.config.attribute_mapping);
        match &result {
            Ok(identity) => debug!("CAS ticket validated for user '{}'", identity.username),
            Err(failure) => warn!("CAS rejected ticket validation ({})", failure.kind()),
        }

        ValidationOutcome {
            result,
            raw_response: Some(body),
        }
    }

    /// Same as [`validate`](Self::validate), flattened into a `ValidationResult`.
    pub async fn validate_ticket(&self, ticket: &str, service: &str) -> ValidationResult {
        self.validate(ticket, service).await.into_result()
    }

    async fn fetch(&self, ticket: &str, service: &str) -> Result<String, ValidationFailure> {
        let url = self.validation_url(ticket, service)?;
        debug!(
            "Validating CAS ticket against {}{} (protocol {})",
            self.config.base_url,
            self.config.validation_endpoint(),
            self.config.protocol_version
        );

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/xml, text/xml")
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .send()
            .await
            .map_err(|e| self.network_failure(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ValidationFailure::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        response.text().await.map_err(|e| self.network_failure(e))
    }

    fn network_failure(&self, error: reqwest::Error) -> ValidationFailure {
        let message = if error.is_timeout() {
            format!("CAS validation timed out after {}ms", self.config.timeout_ms)
        } else {
            error.to_string()
        };
        ValidationFailure::Network { message }
    }
}
