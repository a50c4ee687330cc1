//! Price report and exchange-rate command handlers for the CLI.
//!
//! Both commands run the same pipeline the HTTP server does, against the
//! catalog file and rate upstreams named in the app config.

use vatmac_catalog::{build_report, AggregateResponse, JsonCatalogFile};
use vatmac_core::{normalize_currency_code, AppConfig, VatPolicy};
use vatmac_rates::RateResolver;

/// Build and print the price report.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the report cannot
/// be serialized. Upstream rate failures fall back silently.
pub(crate) async fn run_prices(
    config: &AppConfig,
    currency: &str,
    policy: &VatPolicy,
    json: bool,
) -> anyhow::Result<()> {
    let currency = normalize_currency_code(Some(currency));
    let resolver = RateResolver::new(config.rate_timeout_secs, &config.rate_user_agent)?;
    let resolved = resolver.resolve_rate(&currency).await;
    let catalog = JsonCatalogFile::new(&config.catalog_path);

    let report = build_report(&catalog, resolved, &currency, policy).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_report(&report));
    }
    Ok(())
}

/// Resolve and print one exchange rate.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub(crate) async fn run_rate(config: &AppConfig, currency: &str) -> anyhow::Result<()> {
    let currency = normalize_currency_code(Some(currency));
    let resolver = RateResolver::new(config.rate_timeout_secs, &config.rate_user_agent)?;
    let resolved = resolver.resolve_rate(&currency).await;
    println!("1 {currency} = {:.2} VND ({})", resolved.rate, resolved.source);
    Ok(())
}

/// Render a report as one plain-text table per retailer.
pub(crate) fn format_report(report: &AggregateResponse) -> String {
    let symbol = report.currency_symbol;
    let mut lines = vec![format!(
        "{} | 1 {} = {:.2} VND ({})",
        report.source, report.currency, report.exchange_rate, report.rate_source
    )];

    for (retailer, products) in &report.marketplaces {
        let feed = if products.iter().any(|p| p.product.is_live) {
            "live"
        } else {
            "static"
        };
        lines.push(String::new());
        lines.push(format!(
            "{} ({feed}, {} products)",
            retailer.display_name(),
            products.len()
        ));
        lines.push(format!(
            "{:<18}{:<10}{:>14}{:>12}{:>12}{:>12}",
            "MODEL", "CHIP", "VND", "PRICE", "REFUND", "FINAL"
        ));
        lines.extend(products.iter().map(|p| {
            format!(
                "{:<18}{:<10}{:>14}{:>12}{:>12}{:>12}",
                p.product.model,
                p.product.chip_category,
                fmt_amount(p.product.source_currency_price, ""),
                fmt_amount(p.converted_price, symbol),
                fmt_amount(p.vat_refund_amount, symbol),
                fmt_amount(p.final_price, symbol),
            )
        }));
    }
    lines.join("\n")
}

/// `"-"` for a missing amount, otherwise the symbol followed by the number.
fn fmt_amount(amount: Option<i64>, symbol: &str) -> String {
    amount.map_or_else(|| "-".to_string(), |v| format!("{symbol}{v}"))
}
