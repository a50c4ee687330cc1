pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod normalize;
pub mod trigger;
pub mod types;

pub use aggregate::{
    aggregate, build_report, collect_retailer_results, AggregateResponse, RetailerResult,
};
pub use error::{CatalogError, ScrapeError};
pub use filter::{is_valid, MIN_VALID_PRICE_VND};
pub use loader::{static_catalog, CatalogSource, JsonCatalogFile};
pub use normalize::normalize;
pub use trigger::{ExternalScraper, ScrapeOutcome, ScrapeTrigger};
pub use types::{RawProductRecord, ScrapeSummary};
