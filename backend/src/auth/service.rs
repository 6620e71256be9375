//! Core business logic for CAS single sign-on.

use crate::auth::models::{CasLoginResponse, SessionUser};
use crate::cas::urls::{build_login_url, build_logout_url, service_for_return_url};
use crate::cas::result::ValidationOutcome;
use crate::cas::{TicketValidator, ValidationResult};
use crate::config::Config;
use crate::errors::ServiceResult;
use crate::services::provider_service::ProviderConfigLoader;
use crate::utils::jwt::{JwtUtils, ROLE_ADMIN, ROLE_USER};
use tracing::{debug, info};

/// Result of handing a ticket back from the CAS redirect.
#[derive(Debug)]
pub enum CasLoginOutcome {
    /// Ticket accepted; a session token was issued.
    Authenticated(CasLoginResponse),
    /// Ticket rejected or not verifiable; carries the flattened failure.
    Rejected(ValidationResult),
}

/// Orchestrates the CAS login round trip for any provider the loader knows.
pub struct SsoService<L> {
    loader: L,
    http_client: reqwest::Client,
    jwt_utils: JwtUtils,
    config: Config,
}

impl<L: ProviderConfigLoader> SsoService<L> {
    pub fn new(loader: L, http_client: reqwest::Client, config: &Config) -> Self {
        Self {
            loader,
            http_client,
            jwt_utils: JwtUtils::new(config),
            config: config.clone(),
        }
    }

    /// CAS login redirect for a provider.
    pub async fn login_url(
        &self,
        provider_id: &str,
        return_url: Option<&str>,
    ) -> ServiceResult<String> {
        let config = self.loader.load_provider_config(provider_id).await?;
        Ok(build_login_url(&config, return_url)?)
    }

    /// CAS logout redirect for a provider.
    pub async fn logout_url(
        &self,
        provider_id: &str,
        return_url: Option<&str>,
    ) -> ServiceResult<String> {
        let config = self.loader.load_provider_config(provider_id).await?;
        Ok(build_logout_url(&config, return_url)?)
    }

    /// Validates the ticket CAS handed back and opens a session on success.
    ///
    /// `return_url` must be the same value that was passed to `login_url`,
    /// otherwise the service string will not match and CAS rejects the ticket.
    pub async fn complete_login(
        &self,
        provider_id: &str,
        ticket: &str,
        return_url: Option<&str>,
    ) -> ServiceResult<CasLoginOutcome> {
        let config = self.loader.load_provider_config(provider_id).await?;
        let service = service_for_return_url(&config, return_url)?;

        let validator = TicketValidator::new(config, self.http_client.clone());
        let outcome = validator.validate(ticket, &service).await;

        let identity = match outcome.result {
            Ok(identity) => identity,
            Err(failure) => {
                info!(
                    "CAS login through provider {} rejected ({})",
                    provider_id,
                    failure.kind()
                );
                if let Some(raw) = &outcome.raw_response {
                    debug!("CAS response body: {}", raw);
                }
                // The raw CAS body stays server-side.
                let rejected = ValidationOutcome::failed(failure).into_result();
                return Ok(CasLoginOutcome::Rejected(rejected));
            }
        };

        let role = if self.config.is_admin(&identity.username) {
            ROLE_ADMIN
        } else {
            ROLE_USER
        };
        let access_token = self.jwt_utils.generate_token(&identity, provider_id, role)?;

        info!(
            "User '{}' signed in through CAS provider {}",
            identity.username, provider_id
        );

        Ok(CasLoginOutcome::Authenticated(CasLoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_utils.expires_in_seconds(),
            user: SessionUser {
                employee_number: identity.employee_number,
                username: identity.username,
                name: identity.full_name,
                email: identity.email,
                provider_id: provider_id.to_string(),
                role: role.to_string(),
            },
            return_url: return_url.map(str::to_string),
        }))
    }
}
