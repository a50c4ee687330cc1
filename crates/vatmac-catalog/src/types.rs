//! Record shapes for the two catalog sources.
//!
//! ## Scraped file (`latest_products.json`)
//!
//! Written by the external scraper as
//! `{ "timestamp": ..., "products": [...], "summary": {...} }`.
//! Each product carries `model`, `raw_name`, `price_vnd`, `price_text`,
//! `url`, `image_url` and `shop`. Some scrapers add `chip`, `chip_variant`,
//! `condition` and `available`.
//!
//! ### `price_vnd`
//! Usually an integer, but older scrapers wrote the display text
//! (`"39.990.000₫"`). Text is reduced to its digits; `null`, an empty string
//! or a string without digits all mean "no price".
//!
//! ### `shop`
//! Lower-case retailer code (`cellphones`, `shopdunk`, ...). Records whose
//! shop is not one of the four tracked retailers are dropped by the loader.
//!
//! ## Static catalogs (`config/catalogs.yaml`)
//!
//! Hand-maintained per-retailer price lists used when a retailer has no live
//! data. Keys mirror the original API payload (`vndPrice`).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};
use vatmac_core::Retailer;

/// A listing as it arrives from either source, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProductRecord {
    /// Free-text model name, e.g. `"MacBook Pro 14 M4 Pro 24GB 512GB"`.
    pub model: String,
    /// Untouched retailer title, when the scraper kept it.
    pub raw_name: Option<String>,
    /// Structured chip family hint, e.g. `"M4"`.
    pub chip: Option<String>,
    /// Structured chip variant hint, e.g. `"Pro"`.
    pub chip_variant: Option<String>,
    /// Descriptive configuration text (static catalogs only).
    pub configuration: Option<String>,
    /// Pre-assigned id (static catalogs only).
    pub id: Option<String>,
    pub price_vnd: Option<i64>,
    pub url: Option<String>,
    pub retailer: Retailer,
    pub condition: Option<String>,
    pub available: Option<bool>,
    /// `true` for scraped records, `false` for static catalog entries.
    pub is_live: bool,
}

/// One element of the scraped file's `products` array.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapedRecord {
    pub model: String,

    #[serde(default)]
    pub raw_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_price")]
    pub price_vnd: Option<i64>,

    /// Display price as scraped. Informational only.
    #[serde(default)]
    pub price_text: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,

    pub shop: String,

    #[serde(default)]
    pub chip: Option<String>,

    #[serde(default)]
    pub chip_variant: Option<String>,

    #[serde(default)]
    pub condition: Option<String>,

    #[serde(default)]
    pub available: Option<bool>,
}

impl ScrapedRecord {
    /// Converts into a [`RawProductRecord`], or `None` when `shop` is not a
    /// tracked retailer.
    #[must_use]
    pub fn into_raw(self) -> Option<RawProductRecord> {
        let retailer = Retailer::from_shop_code(&self.shop)?;
        Some(RawProductRecord {
            model: self.model,
            raw_name: self.raw_name,
            chip: self.chip,
            chip_variant: self.chip_variant,
            configuration: None,
            id: None,
            price_vnd: self.price_vnd,
            url: self.url.filter(|u| !u.trim().is_empty()),
            retailer,
            condition: self.condition,
            available: self.available,
            is_live: true,
        })
    }
}

/// Top-level shape of the scraped file.
///
/// `products` is kept as raw JSON so one malformed element does not reject
/// the whole file; `summary` likewise, so a summary schema change never
/// hides the products.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub products: Vec<serde_json::Value>,
    #[serde(default)]
    pub summary: Option<serde_json::Value>,
}

/// Scraper run summary, passed through to the scrape-trigger response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapeSummary {
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub by_shop: BTreeMap<String, ShopRunSummary>,
    #[serde(default)]
    pub errors: Vec<ShopRunError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopRunSummary {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopRunError {
    pub shop: String,
    pub error: String,
}

/// One entry of a static per-retailer catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticCatalogEntry {
    pub model: String,
    pub configuration: String,
    pub vnd_price: i64,
    #[serde(default = "default_available")]
    pub available: bool,
    pub id: String,
    pub url: String,
}

impl StaticCatalogEntry {
    #[must_use]
    pub fn to_raw(&self, retailer: Retailer) -> RawProductRecord {
        RawProductRecord {
            model: self.model.clone(),
            raw_name: None,
            chip: None,
            chip_variant: None,
            configuration: Some(self.configuration.clone()),
            id: Some(self.id.clone()),
            price_vnd: Some(self.vnd_price),
            url: Some(self.url.clone()),
            retailer,
            condition: None,
            available: Some(self.available),
            is_live: false,
        }
    }
}

/// `config/catalogs.yaml` root: retailer marketplace key → entries.
#[derive(Debug, Deserialize)]
pub struct StaticCatalogsFile {
    pub retailers: HashMap<Retailer, Vec<StaticCatalogEntry>>,
}

fn default_available() -> bool {
    true
}

/// Accepts an integer, a float (rounded), or text whose digits form the
/// price. Anything else is `None`.
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(price_from_value))
}

#[allow(clippy::cast_possible_truncation)]
fn price_from_value(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        serde_json::Value::String(s) => {
            let digits: String = s.chars().filter(char::is_ascii_digit).collect();
            digits.parse::<i64>().ok()
        }
        _ => None,
    }
}
