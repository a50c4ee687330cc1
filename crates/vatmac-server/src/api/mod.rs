mod prices;
mod scrape;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use vatmac_catalog::{ExternalScraper, JsonCatalogFile};
use vatmac_rates::RateResolver;

use crate::middleware::{
    enforce_rate_limit, request_id, require_cron_secret, AuthState, RateLimitState,
};

#[derive(Clone)]
pub struct AppState {
    pub rates: Arc<RateResolver>,
    pub catalog: JsonCatalogFile,
    pub scraper: ExternalScraper,
}

/// Errors surfaced as JSON bodies in the shapes existing clients expect.
#[derive(Debug)]
pub enum ApiError {
    /// 500 `{success:false, error, timestamp}`.
    Internal(String),
    Unauthorized,
    MethodNotAllowed,
    NotFound,
    RateLimited,
}

#[derive(Debug, Serialize)]
struct FailureBody {
    success: bool,
    error: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ApiError::Internal(message) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(FailureBody {
                        success: false,
                        error: message,
                        timestamp: Utc::now(),
                    }),
                )
                    .into_response();
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Endpoint not found"),
            ApiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "Too many requests"),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn scrape_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/scrape",
            get(scrape::trigger_scrape)
                .post(scrape::trigger_scrape)
                .fallback(method_not_allowed),
        )
        // Auth runs first so rejected callers never consume the shared window.
        .route_layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_cron_secret,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route(
            "/api/macbook-prices",
            get(prices::get_prices).fallback(method_not_allowed),
        )
        .route("/api/health", get(health).fallback(method_not_allowed));

    Router::new()
        .merge(public_routes)
        .merge(scrape_router(auth, rate_limit))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(build_cors()),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(HealthData {
        status: "healthy",
        timestamp: Utc::now(),
    })
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Scrapes are slow and spawn a process; a handful per minute is plenty.
pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(6, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    pub(super) fn test_state(dir: &std::path::Path, rates: RateResolver) -> AppState {
        let catalog = JsonCatalogFile::new(dir.join("output/latest_products.json"));
        AppState {
            rates: Arc::new(rates),
            catalog: catalog.clone(),
            scraper: ExternalScraper::new(dir, "update.sh", catalog)
                .with_python(Some("sh".to_owned()))
                .with_timeout(Duration::from_secs(10)),
        }
    }

    /// Resolver whose upstreams refuse connections, so every lookup lands on
    /// the static table.
    pub(super) fn offline_rates() -> RateResolver {
        RateResolver::with_endpoints(
            1,
            "vatmac-test/0.1",
            "http://127.0.0.1:9/{currency}",
            "http://127.0.0.1:9/{currency}",
        )
        .expect("build resolver")
    }

    pub(super) async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    fn app(dir: &std::path::Path) -> Router {
        build_app(
            test_state(dir, offline_rates()),
            AuthState::new(None),
            default_rate_limit_state(),
        )
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let dir = tempfile::tempdir().expect("temp dir");
        let response = app(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let dir = tempfile::tempdir().expect("temp dir");
        let response = app(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/api/prices")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Endpoint not found");
    }

    #[tokio::test]
    async fn post_to_prices_is_405() {
        let dir = tempfile::tempdir().expect("temp dir");
        let response = app(dir.path())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/macbook-prices")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(response).await["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn incoming_request_id_is_echoed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let response = app(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(
            response.headers().get("x-request-id").map(|v| v.as_bytes()),
            Some(&b"req-123"[..])
        );
    }

    #[test]
    fn internal_error_uses_failure_shape() {
        let response = ApiError::Internal("boom".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
