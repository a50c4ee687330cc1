mod prices;
mod scrape;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vatmac_core::{VatPolicy, DEFAULT_CURRENCY};

#[derive(Debug, Parser)]
#[command(name = "vatmac-cli")]
#[command(about = "MacBook price and VAT-refund command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the price report from the latest scrape and static catalogs
    Prices {
        /// Target currency (ISO 4217 code)
        #[arg(long, default_value = DEFAULT_CURRENCY)]
        currency: String,
        /// Refund policy: `flat` (8.5% of the price) or `inclusive`
        /// (extracted from a tax-inclusive price, minus the processor's fee)
        #[arg(long, default_value = "flat")]
        policy: VatPolicy,
        /// Print the raw JSON report instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Resolve the VND exchange rate for a currency
    Rate {
        /// Target currency (ISO 4217 code)
        #[arg(long, default_value = DEFAULT_CURRENCY)]
        currency: String,
    },
    /// Run the external scraper once and refresh the catalog file
    Scrape,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = vatmac_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Prices {
            currency,
            policy,
            json,
        }) => prices::run_prices(&config, &currency, &policy, json).await?,
        Some(Commands::Rate { currency }) => prices::run_rate(&config, &currency).await?,
        Some(Commands::Scrape) => scrape::run_scrape(&config).await?,
        None => println!("vatmac-cli: try `vatmac-cli --help`"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
