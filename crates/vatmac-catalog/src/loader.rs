//! Catalog loading from the embedded static lists and the scraped JSON file.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use vatmac_core::Retailer;

use crate::error::CatalogError;
use crate::types::{
    CatalogFile, RawProductRecord, ScrapeSummary, ScrapedRecord, StaticCatalogEntry,
    StaticCatalogsFile,
};

const EMBEDDED_CATALOGS: &str = include_str!("../config/catalogs.yaml");

pub type StaticCatalogs = HashMap<Retailer, Vec<StaticCatalogEntry>>;

static STATIC_CATALOGS: LazyLock<StaticCatalogs> = LazyLock::new(|| {
    parse_static_catalogs(EMBEDDED_CATALOGS).unwrap_or_else(|e| {
        tracing::error!(error = %e, "embedded static catalogs are invalid; serving none");
        HashMap::new()
    })
});

/// Parse and validate a static catalogs YAML document.
///
/// # Errors
///
/// Returns [`CatalogError::StaticParse`] for malformed YAML and
/// [`CatalogError::Validation`] when a retailer is missing or an entry has an
/// empty model/id, a non-positive price, or an id repeated within its retailer.
pub fn parse_static_catalogs(yaml: &str) -> Result<StaticCatalogs, CatalogError> {
    let file: StaticCatalogsFile = serde_yaml::from_str(yaml)?;
    validate_static_catalogs(&file.retailers)?;
    Ok(file.retailers)
}

fn validate_static_catalogs(catalogs: &StaticCatalogs) -> Result<(), CatalogError> {
    for retailer in Retailer::ALL {
        let Some(entries) = catalogs.get(&retailer) else {
            return Err(CatalogError::Validation(format!(
                "no static catalog for retailer '{retailer}'"
            )));
        };

        let mut seen_ids = HashSet::new();
        for entry in entries {
            if entry.model.trim().is_empty() || entry.id.trim().is_empty() {
                return Err(CatalogError::Validation(format!(
                    "entry in '{retailer}' catalog has an empty model or id"
                )));
            }
            if entry.vnd_price <= 0 {
                return Err(CatalogError::Validation(format!(
                    "entry '{}' in '{retailer}' catalog has non-positive price {}",
                    entry.id, entry.vnd_price
                )));
            }
            if !seen_ids.insert(entry.id.as_str()) {
                return Err(CatalogError::Validation(format!(
                    "duplicate id '{}' in '{retailer}' catalog",
                    entry.id
                )));
            }
        }
    }
    Ok(())
}

/// The fixed fallback catalog for `retailer`, as non-live records.
#[must_use]
pub fn static_catalog(retailer: Retailer) -> Vec<RawProductRecord> {
    STATIC_CATALOGS
        .get(&retailer)
        .map(|entries| entries.iter().map(|e| e.to_raw(retailer)).collect())
        .unwrap_or_default()
}

/// Looks up a static entry by id within one retailer's catalog.
#[must_use]
pub fn static_entry(retailer: Retailer, id: &str) -> Option<&'static StaticCatalogEntry> {
    STATIC_CATALOGS
        .get(&retailer)
        .and_then(|entries| entries.iter().find(|e| e.id == id))
}

/// A provider of the most recent scraped catalog.
pub trait CatalogSource {
    /// Returns every well-formed record for a tracked retailer. Never fails;
    /// an unavailable catalog is an empty one.
    fn read_latest_catalog(&self) -> impl Future<Output = Vec<RawProductRecord>> + Send;
}

/// The scraper's JSON output file at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonCatalogFile {
    path: PathBuf,
}

impl JsonCatalogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<CatalogFile, CatalogError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| CatalogError::Io {
                path: self.path.display().to_string(),
                source: e,
            })?;
        parse_catalog_file(&text)
    }

    /// The `summary` block of the current file, if the file is readable and
    /// the block is present and well-formed.
    pub async fn read_summary(&self) -> Option<ScrapeSummary> {
        let file = match self.read_file().await {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(error = %e, "scrape summary unavailable");
                return None;
            }
        };
        let value = file.summary?;
        match serde_json::from_value(value) {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!(error = %e, "scrape summary is malformed");
                None
            }
        }
    }

    /// Last modification time of the file.
    pub async fn modified(&self) -> Option<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(&self.path).await.ok()?;
        metadata.modified().ok().map(DateTime::<Utc>::from)
    }
}

impl CatalogSource for JsonCatalogFile {
    async fn read_latest_catalog(&self) -> Vec<RawProductRecord> {
        match self.read_file().await {
            Ok(file) => {
                let records = records_from_file(file);
                tracing::debug!(
                    path = %self.path.display(),
                    count = records.len(),
                    "loaded scraped catalog"
                );
                records
            }
            Err(e) => {
                tracing::warn!(error = %e, "scraped catalog unavailable; using static catalogs");
                Vec::new()
            }
        }
    }
}

/// Parses the scraped file's top-level structure.
///
/// # Errors
///
/// Returns [`CatalogError::Deserialize`] when the text is not a JSON object
/// of the expected shape.
pub fn parse_catalog_file(text: &str) -> Result<CatalogFile, CatalogError> {
    serde_json::from_str(text).map_err(|e| CatalogError::Deserialize {
        context: "scraped catalog file".to_string(),
        source: e,
    })
}

/// Decodes each product element independently, skipping malformed elements
/// and elements for untracked shops.
#[must_use]
pub fn records_from_file(file: CatalogFile) -> Vec<RawProductRecord> {
    file.products
        .into_iter()
        .enumerate()
        .filter_map(
            |(index, value)| match serde_json::from_value::<ScrapedRecord>(value) {
                Ok(record) => {
                    let shop = record.shop.clone();
                    let raw = record.into_raw();
                    if raw.is_none() {
                        tracing::debug!(index, shop = %shop, "skipping record for untracked shop");
                    }
                    raw
                }
                Err(e) => {
                    tracing::debug!(index, error = %e, "skipping malformed catalog record");
                    None
                }
            },
        )
        .collect()
}
