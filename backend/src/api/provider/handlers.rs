//! Handler functions for SSO provider endpoints.
//!
//! These functions expose the registered CAS providers and let administrators
//! register new ones.

use crate::api::common::{ApiResponse, service_error_to_http, validation_error_response};
use crate::database::models::{CreateCasProviderRequest, SsoProviderInfo};
use crate::services::provider_service::ProviderService;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use sqlx::SqlitePool;
use validator::Validate;

/// Lists enabled providers
#[axum::debug_handler]
pub async fn list_providers(
    Extension(pool): Extension<SqlitePool>,
) -> Result<Json<ApiResponse<Vec<SsoProviderInfo>>>, (StatusCode, String)> {
    let service = ProviderService::new(&pool);

    let providers = service
        .list_enabled_providers()
        .await
        .map_err(service_error_to_http)?;

    let providers: Vec<SsoProviderInfo> = providers.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(
        providers,
        "Providers retrieved successfully",
    )))
}

/// Retrieves a provider by its ID.
#[axum::debug_handler]
pub async fn get_provider(
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SsoProviderInfo>>, (StatusCode, String)> {
    let service = ProviderService::new(&pool);

    let provider = service
        .get_provider_required(&id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::ok(provider.into())))
}

/// Registers a new CAS provider
#[axum::debug_handler]
pub async fn create_provider(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCasProviderRequest>,
) -> Result<Json<ApiResponse<SsoProviderInfo>>, (StatusCode, String)> {
    if let Err(errors) = payload.validate() {
        return Err(validation_error_response(errors));
    }

    tracing::info!(
        "User '{}' is registering CAS provider '{}'",
        claims.username,
        payload.name
    );

    let service = ProviderService::new(&pool);
    let provider = service
        .create_cas_provider(payload)
        .await
        .map_err(|e| {
            tracing::warn!("Failed to register CAS provider: {}", e);
            service_error_to_http(e)
        })?;

    Ok(Json(ApiResponse::success(
        provider.into(),
        "Provider created successfully",
    )))
}

/// Soft-deletes a provider
#[axum::debug_handler]
pub async fn delete_provider(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, (StatusCode, String)> {
    tracing::info!("User '{}' is deleting SSO provider {}", claims.username, id);

    let service = ProviderService::new(&pool);
    service
        .delete_provider(&id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success((), "Provider deleted successfully")))
}
