use serde::{Deserialize, Serialize};

use crate::CoreError;

/// One of the four tracked Vietnamese Apple retailers.
///
/// Serialized in camelCase (`fptShop`, `shopDunk`, ...) because that is the
/// key shape of the `marketplaces` map consumed by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Retailer {
    FptShop,
    ShopDunk,
    TopZone,
    Cellphones,
}

impl Retailer {
    pub const ALL: [Retailer; 4] = [
        Retailer::FptShop,
        Retailer::ShopDunk,
        Retailer::TopZone,
        Retailer::Cellphones,
    ];

    /// Discriminator the scraper writes into each record's `shop` field.
    #[must_use]
    pub fn shop_code(self) -> &'static str {
        match self {
            Retailer::FptShop => "fptshop",
            Retailer::ShopDunk => "shopdunk",
            Retailer::TopZone => "topzone",
            Retailer::Cellphones => "cellphones",
        }
    }

    /// Resolves a scraper `shop` value. Case, spaces, dashes and underscores
    /// are ignored so `"FPT Shop"` and `"fpt_shop"` both resolve.
    #[must_use]
    pub fn from_shop_code(code: &str) -> Option<Self> {
        let key: String = code
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL.into_iter().find(|r| r.shop_code() == key)
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Retailer::FptShop => "FPT Shop",
            Retailer::ShopDunk => "ShopDunk",
            Retailer::TopZone => "TopZone",
            Retailer::Cellphones => "CellphoneS",
        }
    }

    /// Generic MacBook listing page, used when a record carries no link.
    #[must_use]
    pub fn category_url(self) -> &'static str {
        match self {
            Retailer::FptShop => "https://fptshop.com.vn/may-tinh-xach-tay/apple-macbook",
            Retailer::ShopDunk => "https://shopdunk.com/mac",
            Retailer::TopZone => "https://www.topzone.vn/mac",
            Retailer::Cellphones => "https://cellphones.com.vn/laptop/mac.html",
        }
    }
}

impl std::fmt::Display for Retailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.shop_code())
    }
}

impl std::str::FromStr for Retailer {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_shop_code(s).ok_or_else(|| CoreError::UnknownRetailer(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelFamily {
    #[serde(rename = "MacBook Air")]
    Air,
    #[serde(rename = "MacBook Pro")]
    Pro,
    #[serde(rename = "MacBook")]
    Generic,
}

impl ModelFamily {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ModelFamily::Air => "MacBook Air",
            ModelFamily::Pro => "MacBook Pro",
            ModelFamily::Generic => "MacBook",
        }
    }
}

/// Screen diagonal. `Unknown` serializes as an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenSize {
    #[serde(rename = "13\"")]
    Inch13,
    #[serde(rename = "14\"")]
    Inch14,
    #[serde(rename = "15\"")]
    Inch15,
    #[serde(rename = "16\"")]
    Inch16,
    #[serde(rename = "")]
    Unknown,
}

impl ScreenSize {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScreenSize::Inch13 => "13\"",
            ScreenSize::Inch14 => "14\"",
            ScreenSize::Inch15 => "15\"",
            ScreenSize::Inch16 => "16\"",
            ScreenSize::Unknown => "",
        }
    }
}

/// A listing normalized from any source into the shape the pricing
/// pipeline works with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalProduct {
    /// Display label, e.g. `MacBook Pro 16"`, or the bare family when the
    /// size is unknown.
    pub model: String,
    pub model_family: ModelFamily,
    pub screen_size: ScreenSize,
    /// Derived label such as `"M4 Max"`; `"Unknown"` when undeterminable.
    pub chip_category: String,
    pub configuration: String,
    /// Slug used for de-duplication and URL joins. Not globally unique.
    pub id: String,
    /// Price in VND.
    pub source_currency_price: Option<i64>,
    pub url: String,
    pub available: bool,
    pub retailer: Retailer,
    /// `true` when sourced from the scrape, `false` for the static catalog.
    pub is_live: bool,
}

/// A [`CanonicalProduct`] with its target-currency figures.
///
/// The three derived fields are either all present or all `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedProduct {
    #[serde(flatten)]
    pub product: CanonicalProduct,
    pub converted_price: Option<i64>,
    pub vat_refund_amount: Option<i64>,
    pub final_price: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retailer_from_shop_code_is_lenient() {
        assert_eq!(Retailer::from_shop_code("fptshop"), Some(Retailer::FptShop));
        assert_eq!(Retailer::from_shop_code("FPT Shop"), Some(Retailer::FptShop));
        assert_eq!(Retailer::from_shop_code("shop_dunk"), Some(Retailer::ShopDunk));
        assert_eq!(Retailer::from_shop_code("CellphoneS"), Some(Retailer::Cellphones));
        assert_eq!(Retailer::from_shop_code("lazada"), None);
    }

    #[test]
    fn retailer_from_str_reports_unknown() {
        let err = "tiki".parse::<Retailer>().unwrap_err();
        assert!(err.to_string().contains("tiki"));
    }

    #[test]
    fn retailer_serializes_as_marketplace_key() {
        let json = serde_json::to_string(&Retailer::FptShop).unwrap();
        assert_eq!(json, "\"fptShop\"");
        let json = serde_json::to_string(&Retailer::Cellphones).unwrap();
        assert_eq!(json, "\"cellphones\"");
    }

    #[test]
    fn screen_size_unknown_serializes_empty() {
        assert_eq!(serde_json::to_string(&ScreenSize::Unknown).unwrap(), "\"\"");
        assert_eq!(
            serde_json::to_string(&ScreenSize::Inch14).unwrap(),
            "\"14\\\"\""
        );
    }

    #[test]
    fn priced_product_flattens_canonical_fields() {
        let priced = PricedProduct {
            product: CanonicalProduct {
                model: "MacBook Air 13\"".to_string(),
                model_family: ModelFamily::Air,
                screen_size: ScreenSize::Inch13,
                chip_category: "M3".to_string(),
                configuration: "M3, 8GB RAM, 256GB SSD".to_string(),
                id: "m3-8gb-ram-256gb-ssd".to_string(),
                source_currency_price: Some(24_990_000),
                url: "https://shopdunk.com/mac".to_string(),
                available: true,
                retailer: Retailer::ShopDunk,
                is_live: false,
            },
            converted_price: Some(83_859),
            vat_refund_amount: Some(7_128),
            final_price: Some(76_731),
        };
        let value = serde_json::to_value(&priced).unwrap();
        assert_eq!(value["modelFamily"], "MacBook Air");
        assert_eq!(value["chipCategory"], "M3");
        assert_eq!(value["sourceCurrencyPrice"], 24_990_000);
        assert_eq!(value["isLive"], false);
        assert_eq!(value["retailer"], "shopDunk");
        assert_eq!(value["finalPrice"], 76_731);
    }
}
