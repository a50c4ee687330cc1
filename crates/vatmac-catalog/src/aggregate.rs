//! Per-retailer merge and the price report returned to clients.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use vatmac_core::{
    apply_static_adjustment, currency_symbol, price, CanonicalProduct, PricedProduct, Retailer,
    VatPolicy, STATIC_PRICE_ADJUSTMENTS,
};
use vatmac_rates::{RateSource, ResolvedRate};

use crate::filter::is_valid;
use crate::loader::{static_catalog, CatalogSource};
use crate::normalize::normalize;
use crate::types::RawProductRecord;

/// One retailer's candidate feeds before the live/static decision.
#[derive(Debug, Clone)]
pub struct RetailerResult {
    pub retailer: Retailer,
    /// Validated, normalized scraped listings.
    pub live: Vec<CanonicalProduct>,
    /// Normalized static catalog entries.
    pub fallback: Vec<CanonicalProduct>,
}

impl RetailerResult {
    /// The feed to publish: every live listing when there is at least one,
    /// otherwise the static catalog with the retailer's adjustment applied.
    /// The two are never mixed.
    #[must_use]
    pub fn into_feed(self) -> Vec<CanonicalProduct> {
        let feed = if self.live.is_empty() {
            self.fallback
                .into_iter()
                .map(|mut p| {
                    p.source_currency_price = apply_static_adjustment(
                        STATIC_PRICE_ADJUSTMENTS,
                        self.retailer,
                        p.source_currency_price,
                    );
                    p.is_live = false;
                    p
                })
                .collect()
        } else {
            self.live
        };
        dedup_exact(feed)
    }
}

/// Drops listings identical in id, price and URL to an earlier one.
/// Same-id listings that differ in price or URL are distinct offers and stay.
fn dedup_exact(products: Vec<CanonicalProduct>) -> Vec<CanonicalProduct> {
    let mut seen = HashSet::new();
    products
        .into_iter()
        .filter(|p| seen.insert((p.id.clone(), p.source_currency_price, p.url.clone())))
        .collect()
}

/// Payload of `GET /api/macbook-prices`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResponse {
    pub success: bool,
    /// Keyed `fptShop`, `shopDunk`, `topZone`, `cellphones`; every key present.
    pub marketplaces: BTreeMap<Retailer, Vec<PricedProduct>>,
    pub exchange_rate: f64,
    pub rate_source: RateSource,
    pub currency: String,
    pub currency_symbol: &'static str,
    pub vat_policy: VatPolicy,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub note: String,
}

impl AggregateResponse {
    /// Retailers whose feed came from the scrape.
    #[must_use]
    pub fn live_retailers(&self) -> Vec<Retailer> {
        self.marketplaces
            .iter()
            .filter(|(_, products)| products.iter().any(|p| p.product.is_live))
            .map(|(retailer, _)| *retailer)
            .collect()
    }
}

/// Prices every retailer's feed at one rate and assembles the report.
#[must_use]
pub fn aggregate(
    retailers: Vec<RetailerResult>,
    resolved: ResolvedRate,
    currency: &str,
    policy: &VatPolicy,
) -> AggregateResponse {
    let mut marketplaces: BTreeMap<Retailer, Vec<PricedProduct>> =
        Retailer::ALL.into_iter().map(|r| (r, Vec::new())).collect();

    let mut live_count = 0usize;
    for result in retailers {
        let retailer = result.retailer;
        let feed = result.into_feed();
        if feed.iter().any(|p| p.is_live) {
            live_count += 1;
        }
        tracing::debug!(%retailer, count = feed.len(), "retailer feed selected");
        marketplaces
            .entry(retailer)
            .or_default()
            .extend(feed.into_iter().map(|p| price(p, resolved.rate, policy)));
    }

    AggregateResponse {
        success: true,
        marketplaces,
        exchange_rate: resolved.rate,
        rate_source: resolved.source,
        currency: currency.to_owned(),
        currency_symbol: currency_symbol(currency),
        vat_policy: policy.clone(),
        timestamp: Utc::now(),
        source: describe_source(resolved.source, live_count),
        note: format!(
            "Prices are from official Vietnamese Apple retailers. A VAT refund of {}% is \
             included in final price calculations for tourists.",
            policy.tax_rate_percent().normalize()
        ),
    }
}

fn describe_source(rate_source: RateSource, live_retailers: usize) -> String {
    let rate = match rate_source {
        RateSource::Primary | RateSource::Secondary => "Live Exchange Rate",
        RateSource::StaticFallback => "Fallback Exchange Rate",
    };
    let catalog = match live_retailers {
        0 => "Official Vietnam Marketplace Pricing".to_owned(),
        n if n == Retailer::ALL.len() => "Live Scraped Marketplace Pricing".to_owned(),
        n => format!(
            "Live Scraped Pricing ({n} of {}) + Official Marketplace Pricing",
            Retailer::ALL.len()
        ),
    };
    format!("{rate} + {catalog}")
}

/// Splits scraped records per retailer, validates and normalizes them, and
/// pairs each retailer with its normalized static catalog.
#[must_use]
pub fn collect_retailer_results(scraped: Vec<RawProductRecord>) -> Vec<RetailerResult> {
    let mut live: BTreeMap<Retailer, Vec<CanonicalProduct>> = BTreeMap::new();
    let mut rejected = 0usize;
    for record in scraped {
        if is_valid(&record) {
            live.entry(record.retailer)
                .or_default()
                .push(normalize(record));
        } else {
            rejected += 1;
        }
    }
    if rejected > 0 {
        tracing::debug!(rejected, "dropped invalid scraped listings");
    }

    Retailer::ALL
        .into_iter()
        .map(|retailer| RetailerResult {
            retailer,
            live: live.remove(&retailer).unwrap_or_default(),
            fallback: static_catalog(retailer).into_iter().map(normalize).collect(),
        })
        .collect()
}

/// Runs one full pipeline pass: load, validate, normalize, merge, price.
pub async fn build_report<S>(
    source: &S,
    resolved: ResolvedRate,
    currency: &str,
    policy: &VatPolicy,
) -> AggregateResponse
where
    S: CatalogSource + Sync,
{
    let scraped = source.read_latest_catalog().await;
    let results = collect_retailer_results(scraped);
    let report = aggregate(results, resolved, currency, policy);
    tracing::info!(
        currency = %report.currency,
        rate = report.exchange_rate,
        live_retailers = report.live_retailers().len(),
        "price report built"
    );
    report
}
