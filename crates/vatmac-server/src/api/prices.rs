use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use vatmac_catalog::{build_report, AggregateResponse};
use vatmac_core::{normalize_currency_code, VatPolicy};

use crate::middleware::RequestId;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct PricesQuery {
    pub currency: Option<String>,
}

/// `GET /api/macbook-prices?currency=INR`
///
/// The pipeline runs on its own task so a fault inside it becomes a JSON 500
/// instead of a dropped connection.
pub(super) async fn get_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PricesQuery>,
) -> Result<Json<AggregateResponse>, ApiError> {
    let currency = normalize_currency_code(query.currency.as_deref());
    tracing::info!(request_id = %req_id.0, currency = %currency, "building price report");

    let task = tokio::spawn(async move {
        let resolved = state.rates.resolve_rate(&currency).await;
        build_report(&state.catalog, resolved, &currency, &VatPolicy::default()).await
    });

    match task.await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            tracing::error!(request_id = %req_id.0, error = %e, "price report failed");
            Err(ApiError::Internal("failed to build price report".to_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::tests::{body_json, offline_rates, test_state};
    use super::super::{build_app, default_rate_limit_state};
    use crate::middleware::AuthState;
    use vatmac_rates::RateResolver;

    async fn get(app: axum::Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    #[tokio::test]
    async fn default_currency_is_inr_with_static_rate() {
        let dir = tempfile::tempdir().expect("temp dir");
        let app = build_app(
            test_state(dir.path(), offline_rates()),
            AuthState::new(None),
            default_rate_limit_state(),
        );

        let response = get(app, "/api/macbook-prices").await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["currency"], "INR");
        assert_eq!(json["exchangeRate"], 298.0);
        assert_eq!(json["rateSource"], "static_fallback");
        let fpt = json["marketplaces"]["fptShop"].as_array().expect("fptShop");
        assert_eq!(fpt[0]["convertedPrice"], 218_087);
        assert_eq!(fpt[0]["vatRefundAmount"], 18_537);
        assert_eq!(fpt[0]["finalPrice"], 199_550);
        assert_eq!(fpt[0]["isLive"], false);
    }

    #[tokio::test]
    async fn currency_is_upper_cased_and_resolved_live() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote/usd-to-vnd-rate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<h3>$1 USD = 26,000 VND</h3>"),
            )
            .mount(&server)
            .await;
        let rates = RateResolver::with_endpoints(
            5,
            "vatmac-test/0.1",
            &format!("{}/quote/{{currency}}-to-vnd-rate", server.uri()),
            &format!("{}/v4/latest/{{currency}}", server.uri()),
        )
        .expect("build resolver");

        let dir = tempfile::tempdir().expect("temp dir");
        let app = build_app(
            test_state(dir.path(), rates),
            AuthState::new(None),
            default_rate_limit_state(),
        );

        let response = get(app, "/api/macbook-prices?currency=usd").await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["currency"], "USD");
        assert_eq!(json["currencySymbol"], "$");
        assert_eq!(json["exchangeRate"], 26_000.0);
        assert_eq!(json["rateSource"], "primary");
        // 39,990,000 / 26,000 = 1538.08
        let cellphones = json["marketplaces"]["cellphones"]
            .as_array()
            .expect("cellphones");
        assert_eq!(cellphones[0]["convertedPrice"], 1_538);
    }
}
