//! SSO backend library.
//!
//! Hosts the CAS client (`cas`), the SSO login flow (`auth`), the provider
//! management API and the persistence layer, plus the router that ties them
//! together for the server binary.

pub mod api;
pub mod auth;
pub mod cas;
pub mod config;
pub mod database;
pub mod errors;
pub mod repositories;
pub mod services;
pub mod utils;

use crate::api::common::ApiResponse;
use crate::config::Config;
use crate::utils::jwt::JwtUtils;
use axum::{Extension, Router, response::Json, routing::get};
use sqlx::SqlitePool;
use tower::ServiceBuilder;

/// Builds the application router with its shared extensions.
pub fn app(pool: SqlitePool, config: Config, http_client: reqwest::Client) -> Router {
    let jwt_utils = JwtUtils::new(&config);

    Router::new()
        .route("/", get(root_handler))
        .nest("/auth", auth::routes::auth_router())
        .nest("/api/providers", api::provider::routes::provider_router())
        .layer(
            ServiceBuilder::new()
                .layer(Extension(pool))
                .layer(Extension(jwt_utils))
                .layer(Extension(config))
                .layer(Extension(http_client)),
        )
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "SSO Backend",
            "version": env!("CARGO_PKG_VERSION")
        }),
        "Welcome to the SSO API",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cas::CasIdentity;
    use crate::database::models::CreateCasProviderRequest;
    use crate::database::test_pool;
    use crate::services::provider_service::ProviderService;
    use crate::utils::jwt::tests::{identity, test_config};
    use crate::utils::jwt::{ROLE_ADMIN, ROLE_USER};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::Value;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn register_provider(pool: &SqlitePool, base_url: &str) -> String {
        let request: CreateCasProviderRequest = serde_json::from_value(serde_json::json!({
            "name": "Corp",
            "settings": {
                "base_url": base_url,
                "service_url": "https://app.example.com/auth/cas/corp/callback",
                "timeout_ms": 2000
            }
        }))
        .unwrap();
        ProviderService::new(pool)
            .create_cas_provider(request)
            .await
            .unwrap()
            .id
    }

    fn bearer(identity: &CasIdentity, role: &str) -> String {
        let token = JwtUtils::new(&test_config())
            .generate_token(identity, "corp", role)
            .unwrap();
        format!("Bearer {}", token)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_login_redirects_to_cas() {
        let pool = test_pool().await;
        let id = register_provider(&pool, "https://cas.example.com/cas/").await;
        let app = app(pool, test_config(), reqwest::Client::new());

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/auth/cas/{}/login?returnUrl=%2Fhome", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert_eq!(
            location,
            "https://cas.example.com/cas/login?service=https%3A%2F%2Fapp.example.com%2Fauth%2Fcas%2Fcorp%2Fcallback%3FreturnUrl%3D%252Fhome"
        );
    }

    #[tokio::test]
    async fn test_logout_and_unknown_provider() {
        let pool = test_pool().await;
        let id = register_provider(&pool, "https://cas.example.com").await;
        let app = app(pool, test_config(), reqwest::Client::new());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/auth/cas/{}/logout", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://cas.example.com/logout"
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/cas/missing/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_callback_issues_token_usable_on_me() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/serviceValidate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<cas:serviceResponse><cas:authenticationSuccess><cas:user>root</cas:user><cas:attributes><cas:name>Root User</cas:name></cas:attributes></cas:authenticationSuccess></cas:serviceResponse>",
            ))
            .mount(&server)
            .await;

        let pool = test_pool().await;
        let id = register_provider(&pool, &server.uri()).await;
        let app = app(pool, test_config(), reqwest::Client::new());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/auth/cas/{}/callback?ticket=ST-1", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["user"]["username"], "root");
        assert_eq!(json["data"]["user"]["role"], ROLE_ADMIN);
        let token = json["data"]["access_token"].as_str().unwrap().to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["name"], "Root User");
        assert_eq!(json["data"]["employee_number"], "root");
    }

    #[tokio::test]
    async fn test_callback_rejection_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let pool = test_pool().await;
        let id = register_provider(&pool, &server.uri()).await;
        let app = app(pool, test_config(), reqwest::Client::new());

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/auth/cas/{}/callback?ticket=ST-1", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["details"][0]["field"], "error");
        assert_eq!(
            json["error"]["details"][0]["message"],
            "HTTP 500: Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let app = app(test_pool().await, test_config(), reqwest::Client::new());

        let response = app
            .oneshot(Request::builder().uri("/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_provider_admin_routes_require_admin_role() {
        let pool = test_pool().await;
        let id = register_provider(&pool, "https://cas.example.com").await;
        let app = app(pool, test_config(), reqwest::Client::new());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/providers")
                    .header(header::AUTHORIZATION, bearer(&identity("jdoe"), ROLE_USER))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"][0]["id"], id.as_str());
        assert_eq!(json["data"][0]["settings"]["timeout_ms"], 2000);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/providers/{}", id))
                    .header(header::AUTHORIZATION, bearer(&identity("jdoe"), ROLE_USER))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/providers/{}", id))
                    .header(header::AUTHORIZATION, bearer(&identity("root"), ROLE_ADMIN))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_provider_validates_payload() {
        let app = app(test_pool().await, test_config(), reqwest::Client::new());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/providers")
                    .header(header::AUTHORIZATION, bearer(&identity("root"), ROLE_ADMIN))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "name": "",
                            "settings": {
                                "base_url": "https://cas.example.com",
                                "service_url": "https://app.example.com/cb"
                            }
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["details"][0]["field"], "name");
    }
}
