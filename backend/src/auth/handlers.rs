//! Handler functions for the CAS single sign-on endpoints.
//!
//! These functions parse the redirect parameters, resolve the provider, and
//! hand off to `auth::service` for the CAS round trip.

use crate::api::common::{ApiResponse, cas_rejection_to_http, service_error_to_http};
use crate::auth::models::*;
use crate::auth::service::{CasLoginOutcome, SsoService};
use crate::config::Config;
use crate::services::provider_service::ProviderService;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{Json as ResponseJson, Redirect},
};
use sqlx::SqlitePool;

fn sso_service<'a>(
    pool: &'a SqlitePool,
    http_client: reqwest::Client,
    config: &Config,
) -> SsoService<ProviderService<'a>> {
    SsoService::new(ProviderService::new(pool), http_client, config)
}

/// Redirect the browser to the provider's CAS login page
#[axum::debug_handler]
pub async fn cas_login(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Extension(http_client): Extension<reqwest::Client>,
    Path(provider_id): Path<String>,
    Query(query): Query<RedirectQuery>,
) -> Result<Redirect, (StatusCode, String)> {
    let service = sso_service(&pool, http_client, &config);

    match service
        .login_url(&provider_id, query.return_url.as_deref())
        .await
    {
        Ok(url) => Ok(Redirect::to(&url)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Exchange the ticket CAS handed back for a session token
#[axum::debug_handler]
pub async fn cas_callback(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Extension(http_client): Extension<reqwest::Client>,
    Path(provider_id): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<ResponseJson<ApiResponse<CasLoginResponse>>, (StatusCode, String)> {
    let service = sso_service(&pool, http_client, &config);

    let outcome = service
        .complete_login(&provider_id, &query.ticket, query.return_url.as_deref())
        .await
        .map_err(service_error_to_http)?;

    match outcome {
        CasLoginOutcome::Authenticated(response) => Ok(ResponseJson(ApiResponse::success(
            response,
            "Signed in successfully",
        ))),
        CasLoginOutcome::Rejected(result) => Err(cas_rejection_to_http(&result)),
    }
}

/// Redirect the browser to the provider's CAS logout page
///
/// Session tokens are stateless, so the client drops its token on its own.
#[axum::debug_handler]
pub async fn cas_logout(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Extension(http_client): Extension<reqwest::Client>,
    Path(provider_id): Path<String>,
    Query(query): Query<RedirectQuery>,
) -> Result<Redirect, (StatusCode, String)> {
    let service = sso_service(&pool, http_client, &config);

    match service
        .logout_url(&provider_id, query.return_url.as_deref())
        .await
    {
        Ok(url) => Ok(Redirect::to(&url)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Get current user information from token
#[axum::debug_handler]
pub async fn me(
    Extension(claims): Extension<Claims>,
) -> Result<ResponseJson<ApiResponse<SessionUser>>, (StatusCode, String)> {
    Ok(ResponseJson(ApiResponse::ok(SessionUser::from(claims))))
}
