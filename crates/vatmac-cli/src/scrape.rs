//! Scrape trigger command handler for the CLI.

use vatmac_catalog::{ExternalScraper, ScrapeTrigger};
use vatmac_core::AppConfig;

/// Run the external scraper once and print its summary.
///
/// # Errors
///
/// Returns an error if the interpreter cannot be found, the script exits
/// non-zero, times out, or floods its output. Captured diagnostics are
/// printed to stderr first.
pub(crate) async fn run_scrape(config: &AppConfig) -> anyhow::Result<()> {
    let scraper = ExternalScraper::from_config(config);
    let outcome = match scraper.trigger_scrape().await {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Some(details) = e.details() {
                eprintln!("{details}");
            }
            return Err(e.into());
        }
    };

    println!("{}", outcome.stdout_tail);
    println!("scraper finished in {:.2}s", outcome.duration.as_secs_f64());
    if let Some(updated) = outcome.file_updated {
        println!("catalog updated at {updated}");
    }
    if let Some(summary) = outcome.summary {
        println!("{} products scraped", summary.total_products);
        for (shop, run) in &summary.by_shop {
            let status = if run.success { "ok" } else { "failed" };
            println!("  {shop:<12}{:>6}  {status}", run.count);
        }
        for err in &summary.errors {
            eprintln!("  {}: {}", err.shop, err.error);
        }
    }
    Ok(())
}
