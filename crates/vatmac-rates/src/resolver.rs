//! Exchange rate resolution with a three-step fallback chain.
//!
//! 1. Quote page (HTML), validated against [`plausible_range`].
//! 2. Rate API (JSON), any positive value accepted.
//! 3. [`static_fallback_rate`].
//!
//! Steps run sequentially, each only when the previous produced nothing
//! usable. Failures are logged and swallowed; there are no retries.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::RateError;
use crate::parse::quote_candidates;
use crate::table::{plausible_range, static_fallback_rate};

/// Default quote page. `{currency}` is replaced with the lower-case code.
pub const DEFAULT_PRIMARY_URL: &str =
    "https://wise.com/in/currency-converter/{currency}-to-vnd-rate";

/// Default rate API. `{currency}` is replaced with the upper-case code.
pub const DEFAULT_SECONDARY_URL: &str = "https://api.exchangerate-api.com/v4/latest/{currency}";

/// Which step of the chain produced a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Primary,
    Secondary,
    StaticFallback,
}

impl std::fmt::Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateSource::Primary => write!(f, "primary"),
            RateSource::Secondary => write!(f, "secondary"),
            RateSource::StaticFallback => write!(f, "static_fallback"),
        }
    }
}

/// VND per one unit of the target currency, plus where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedRate {
    pub rate: f64,
    pub source: RateSource,
}

/// `GET /v4/latest/{CODE}` response; only the `rates` map is read.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Resolves VND exchange rates for a target currency. Never fails.
pub struct RateResolver {
    client: Client,
    primary_url: String,
    secondary_url: String,
}

impl RateResolver {
    /// Creates a resolver against the default upstreams.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, RateError> {
        Self::with_endpoints(
            timeout_secs,
            user_agent,
            DEFAULT_PRIMARY_URL,
            DEFAULT_SECONDARY_URL,
        )
    }

    /// Creates a resolver against explicit URL templates. Each template may
    /// contain a `{currency}` placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::Http`] if the client cannot be constructed.
    pub fn with_endpoints(
        timeout_secs: u64,
        user_agent: &str,
        primary_url: &str,
        secondary_url: &str,
    ) -> Result<Self, RateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            primary_url: primary_url.to_owned(),
            secondary_url: secondary_url.to_owned(),
        })
    }

    /// Resolves the VND rate for `target_currency` (an ISO code, any case).
    ///
    /// Codes that are not three ASCII letters never reach the network and
    /// resolve straight to the static table.
    pub async fn resolve_rate(&self, target_currency: &str) -> ResolvedRate {
        let code = target_currency.trim().to_ascii_uppercase();

        if !is_currency_code(&code) {
            tracing::warn!(currency = %code, "malformed currency code; using static fallback");
            return Self::fallback(&code);
        }

        match self.fetch_primary(&code).await {
            Ok(rate) => {
                tracing::info!(currency = %code, rate, "exchange rate from quote page");
                return ResolvedRate {
                    rate,
                    source: RateSource::Primary,
                };
            }
            Err(e) => {
                tracing::warn!(currency = %code, error = %e, "quote page rate unavailable");
            }
        }

        match self.fetch_secondary(&code).await {
            Ok(rate) => {
                tracing::info!(currency = %code, rate, "exchange rate from rate API");
                return ResolvedRate {
                    rate,
                    source: RateSource::Secondary,
                };
            }
            Err(e) => {
                tracing::warn!(currency = %code, error = %e, "rate API unavailable");
            }
        }

        Self::fallback(&code)
    }

    fn fallback(code: &str) -> ResolvedRate {
        let rate = static_fallback_rate(code);
        tracing::info!(currency = %code, rate, "using static fallback exchange rate");
        ResolvedRate {
            rate,
            source: RateSource::StaticFallback,
        }
    }

    /// Scrapes the quote page and returns the first candidate strictly
    /// inside the currency's plausible range.
    ///
    /// # Errors
    ///
    /// - [`RateError::UnsupportedCurrency`]: no range known; page not fetched.
    /// - [`RateError::Http`] / [`RateError::UnexpectedStatus`]: transport failure.
    /// - [`RateError::Unparseable`]: no quote found in the page.
    /// - [`RateError::OutOfRange`]: quotes found, none plausible.
    pub async fn fetch_primary(&self, code: &str) -> Result<f64, RateError> {
        let (min, max) = plausible_range(code).ok_or_else(|| RateError::UnsupportedCurrency {
            currency: code.to_owned(),
        })?;

        let url = expand_template(&self.primary_url, &code.to_ascii_lowercase());
        let response = self
            .client
            .get(&url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let html = response.text().await?;
        let candidates = quote_candidates(&html, code);
        let Some(&first) = candidates.first() else {
            return Err(RateError::Unparseable { url });
        };

        candidates
            .into_iter()
            .find(|rate| *rate > min && *rate < max)
            .ok_or_else(|| RateError::OutOfRange {
                currency: code.to_owned(),
                rate: first,
                min,
                max,
            })
    }

    /// Reads the VND leg from the rate API. No range check is applied; only
    /// values that cannot divide a price (zero, negative) are refused.
    ///
    /// # Errors
    ///
    /// - [`RateError::Http`] / [`RateError::UnexpectedStatus`]: transport failure.
    /// - [`RateError::Deserialize`]: body is not the expected JSON.
    /// - [`RateError::Unparseable`]: no `VND` entry.
    /// - [`RateError::Unusable`]: `VND` entry is not positive.
    pub async fn fetch_secondary(&self, code: &str) -> Result<f64, RateError> {
        let url = expand_template(&self.secondary_url, code);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<LatestRatesResponse>(&body).map_err(|e| {
            RateError::Deserialize {
                context: format!("latest rates for {code}"),
                source: e,
            }
        })?;

        let rate = parsed
            .rates
            .get("VND")
            .copied()
            .ok_or(RateError::Unparseable { url })?;

        if rate.is_finite() && rate > 0.0 {
            Ok(rate)
        } else {
            Err(RateError::Unusable {
                currency: code.to_owned(),
                rate,
            })
        }
    }
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

fn expand_template(template: &str, code: &str) -> String {
    template.replace("{currency}", code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_template_substitutes_code() {
        assert_eq!(
            expand_template(DEFAULT_PRIMARY_URL, "inr"),
            "https://wise.com/in/currency-converter/inr-to-vnd-rate"
        );
        assert_eq!(
            expand_template(DEFAULT_SECONDARY_URL, "USD"),
            "https://api.exchangerate-api.com/v4/latest/USD"
        );
    }

    #[test]
    fn currency_code_shape() {
        assert!(is_currency_code("INR"));
        assert!(!is_currency_code("IN"));
        assert!(!is_currency_code("IN/R"));
        assert!(!is_currency_code("../etc"));
    }

    #[tokio::test]
    async fn malformed_code_skips_network() {
        // Unroutable endpoints: a network attempt would surface as a slow failure,
        // but the code check short-circuits before any request.
        let resolver = RateResolver::with_endpoints(
            1,
            "vatmac-test/0.1",
            "http://127.0.0.1:9/{currency}",
            "http://127.0.0.1:9/{currency}",
        )
        .unwrap();
        let resolved = resolver.resolve_rate("not a code").await;
        assert_eq!(resolved.source, RateSource::StaticFallback);
        assert!((resolved.rate - 298.0).abs() < f64::EPSILON);
    }
}
