pub mod app_config;
pub mod config;
pub mod currency;
pub mod pricing;
pub mod products;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use currency::{currency_symbol, normalize_currency_code, DEFAULT_CURRENCY};
pub use pricing::{
    apply_static_adjustment, price, static_price_offset, PriceAdjustment, RefundMethod,
    VatPolicy, STATIC_PRICE_ADJUSTMENTS,
};
pub use products::{CanonicalProduct, ModelFamily, PricedProduct, Retailer, ScreenSize};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid VAT policy: {0}")]
    InvalidVatPolicy(String),

    #[error("unknown retailer: {0}")]
    UnknownRetailer(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
