//! SSO provider business logic and CAS configuration resolution.

use crate::cas::{CasSettings, ProviderConfig};
use crate::database::models::{
    CAS_PROTOCOL, CreateCasProviderRequest, CreateSsoProvider, SsoProvider,
};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::provider_repository::ProviderRepository;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{info, warn};
use validator::Validate;

/// Source of CAS provider configuration, looked up by provider ID.
#[async_trait]
pub trait ProviderConfigLoader: Send + Sync {
    async fn load_provider_config(&self, provider_id: &str) -> ServiceResult<ProviderConfig>;
}

/// Service layer for SSO provider operations.
pub struct ProviderService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> ProviderService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Registers a new CAS provider.
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Validation failures (name, URLs, timeout)
    /// - Duplicate provider names
    pub async fn create_cas_provider(
        &self,
        request: CreateCasProviderRequest,
    ) -> ServiceResult<SsoProvider> {
        request.validate()?;

        // Reject settings the login flow could not use later on.
        request
            .settings
            .clone()
            .into_provider_config()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let repo = ProviderRepository::new(self.pool);
        if repo.provider_name_exists(&request.name).await? {
            return Err(ServiceError::already_exists("SSO provider", &request.name));
        }

        let settings = serde_json::to_string(&request.settings)
            .map_err(|e| ServiceError::internal_error(e.to_string()))?;

        let create = CreateSsoProvider {
            id: uuid::Uuid::now_v7().to_string(),
            name: request.name,
            protocol: CAS_PROTOCOL.to_string(),
            settings,
            is_enabled: request.is_enabled,
        };
        create.validate()?;

        let provider = repo.create_provider(create).await?;
        info!("Registered CAS provider '{}' ({})", provider.name, provider.id);
        Ok(provider)
    }

    /// Retrieves a provider by ID, returning error if not found.
    pub async fn get_provider_required(&self, id: &str) -> ServiceResult<SsoProvider> {
        let repo = ProviderRepository::new(self.pool);
        let provider = repo
            .get_provider_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("SSO provider", id))?;
        Ok(provider)
    }

    pub async fn list_enabled_providers(&self) -> ServiceResult<Vec<SsoProvider>> {
        let repo = ProviderRepository::new(self.pool);
        Ok(repo.list_enabled_providers().await?)
    }

    pub async fn delete_provider(&self, id: &str) -> ServiceResult<()> {
        let repo = ProviderRepository::new(self.pool);
        if !repo.delete_provider(id).await? {
            return Err(ServiceError::not_found("SSO provider", id));
        }
        info!("Deleted SSO provider {}", id);
        Ok(())
    }
}

#[async_trait]
impl<'a> ProviderConfigLoader for ProviderService<'a> {
    /// Loads and decodes the CAS settings of an enabled provider.
    async fn load_provider_config(&self, provider_id: &str) -> ServiceResult<ProviderConfig> {
        let provider = self.get_provider_required(provider_id).await?;

        if !provider.is_enabled {
            return Err(ServiceError::invalid_operation(format!(
                "SSO provider '{}' is disabled",
                provider.name
            )));
        }
        if !provider.is_cas() {
            return Err(ServiceError::validation(format!(
                "SSO provider '{}' uses protocol '{}', not CAS",
                provider.name, provider.protocol
            )));
        }

        let settings: CasSettings = serde_json::from_str(&provider.settings).map_err(|e| {
            warn!("Stored settings for provider {} are unreadable: {}", provider.id, e);
            ServiceError::configuration(format!(
                "Invalid CAS settings for provider '{}': {}",
                provider.name, e
            ))
        })?;

        Ok(settings.into_provider_config()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cas::config::CasVersion;
    use crate::database::test_pool;

    fn cas_request(name: &str) -> CreateCasProviderRequest {
        CreateCasProviderRequest {
            name: name.to_string(),
            settings: serde_json::from_value(serde_json::json!({
                "base_url": "https://cas.example.com/cas",
                "service_url": "https://app.example.com/auth/cas/callback",
                "version": "3.0",
                "timeout_ms": 5000,
                "attribute_mapping": {"employee_id": "cas:employeeNumber"}
            }))
            .unwrap(),
            is_enabled: true,
        }
    }

    async fn insert_raw(pool: &SqlitePool, id: &str, protocol: &str, settings: &str, enabled: bool) {
        ProviderRepository::new(pool)
            .create_provider(CreateSsoProvider {
                id: id.to_string(),
                name: id.to_string(),
                protocol: protocol.to_string(),
                settings: settings.to_string(),
                is_enabled: enabled,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_resolve_provider() {
        let pool = test_pool().await;
        let service = ProviderService::new(&pool);

        let provider = service.create_cas_provider(cas_request("Corp")).await.unwrap();
        let config = service.load_provider_config(&provider.id).await.unwrap();

        assert_eq!(config.base_url, "https://cas.example.com/cas");
        assert_eq!(config.protocol_version, CasVersion::V3);
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.validation_endpoint(), "/p3/serviceValidate");
        assert_eq!(config.attribute_mapping.employee_id, "cas:employeeNumber");
        assert_eq!(config.attribute_mapping.full_name, "cas:name");
    }

    #[tokio::test]
    async fn test_duplicate_names_are_rejected() {
        let pool = test_pool().await;
        let service = ProviderService::new(&pool);

        service.create_cas_provider(cas_request("Corp")).await.unwrap();
        let err = service.create_cas_provider(cas_request("Corp")).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_invalid_settings_are_rejected_on_create() {
        let pool = test_pool().await;
        let service = ProviderService::new(&pool);

        let mut request = cas_request("Corp");
        request.settings.service_url = "/relative".to_string();
        let err = service.create_cas_provider(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));

        let request = cas_request("");
        let err = service.create_cas_provider(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_resolver_errors() {
        let pool = test_pool().await;
        let settings = r#"{"base_url":"https://cas.example.com","service_url":"https://app.example.com/cb"}"#;
        insert_raw(&pool, "disabled", "cas", settings, false).await;
        insert_raw(&pool, "oauth", "oauth2", settings, true).await;
        insert_raw(&pool, "broken", "cas", "{\"base_url\": 1}", true).await;
        insert_raw(
            &pool,
            "relative",
            "cas",
            r#"{"base_url":"https://cas.example.com","service_url":"/cb"}"#,
            true,
        )
        .await;

        let service = ProviderService::new(&pool);
        assert!(matches!(
            service.load_provider_config("missing").await,
            Err(ServiceError::NotFound { .. })
        ));
        assert!(matches!(
            service.load_provider_config("disabled").await,
            Err(ServiceError::InvalidOperation { .. })
        ));
        assert!(matches!(
            service.load_provider_config("oauth").await,
            Err(ServiceError::Validation { .. })
        ));
        assert!(matches!(
            service.load_provider_config("broken").await,
            Err(ServiceError::Configuration { .. })
        ));
        assert!(matches!(
            service.load_provider_config("relative").await,
            Err(ServiceError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_provider() {
        let pool = test_pool().await;
        let service = ProviderService::new(&pool);

        let provider = service.create_cas_provider(cas_request("Corp")).await.unwrap();
        service.delete_provider(&provider.id).await.unwrap();

        assert!(service.list_enabled_providers().await.unwrap().is_empty());
        assert!(matches!(
            service.delete_provider(&provider.id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
