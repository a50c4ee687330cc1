//! VND → target-currency conversion and tourist VAT-refund estimation.
//!
//! All arithmetic runs on [`Decimal`]. The converted price and the refund are
//! each rounded once, half away from zero, from the unrounded conversion; the
//! final price is their difference, so `final = converted - refund` holds
//! exactly for every priced product.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::products::{CanonicalProduct, PricedProduct, Retailer};
use crate::CoreError;

/// How the refundable tax is extracted from the converted price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundMethod {
    /// `price * rate / 100`: the rate is applied straight to the price.
    Flat,
    /// `price * rate / (100 + rate)`: the price is treated as tax-inclusive.
    Inclusive,
}

/// Tax rate, extraction method and the share of the refund the traveler
/// keeps after the airport processor's fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VatPolicy {
    tax_rate_percent: Decimal,
    method: RefundMethod,
    fee_retention: Decimal,
}

impl VatPolicy {
    /// Builds a policy.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidVatPolicy`] unless `0 <= tax_rate_percent <= 100`
    /// and `0 <= fee_retention <= 1`. Those bounds keep the refund between
    /// zero and the converted price.
    pub fn new(
        tax_rate_percent: Decimal,
        method: RefundMethod,
        fee_retention: Decimal,
    ) -> Result<Self, CoreError> {
        if tax_rate_percent < Decimal::ZERO || tax_rate_percent > Decimal::ONE_HUNDRED {
            return Err(CoreError::InvalidVatPolicy(format!(
                "tax rate {tax_rate_percent}% is outside 0..=100"
            )));
        }
        if fee_retention < Decimal::ZERO || fee_retention > Decimal::ONE {
            return Err(CoreError::InvalidVatPolicy(format!(
                "fee retention {fee_retention} is outside 0..=1"
            )));
        }
        Ok(Self {
            tax_rate_percent,
            method,
            fee_retention,
        })
    }

    /// 8.5% applied directly to the converted price, no processing fee.
    #[must_use]
    pub fn flat() -> Self {
        Self {
            tax_rate_percent: Decimal::new(85, 1),
            method: RefundMethod::Flat,
            fee_retention: Decimal::ONE,
        }
    }

    /// 8.5% extracted from a tax-inclusive price, of which the traveler keeps
    /// 78% after the processor's cut.
    #[must_use]
    pub fn inclusive() -> Self {
        Self {
            tax_rate_percent: Decimal::new(85, 1),
            method: RefundMethod::Inclusive,
            fee_retention: Decimal::new(78, 2),
        }
    }

    #[must_use]
    pub fn tax_rate_percent(&self) -> Decimal {
        self.tax_rate_percent
    }

    #[must_use]
    pub fn method(&self) -> RefundMethod {
        self.method
    }

    #[must_use]
    pub fn fee_retention(&self) -> Decimal {
        self.fee_retention
    }

    /// Fraction of the converted price paid back to the traveler.
    #[must_use]
    pub fn refund_factor(&self) -> Decimal {
        let gross = match self.method {
            RefundMethod::Flat => self.tax_rate_percent / Decimal::ONE_HUNDRED,
            RefundMethod::Inclusive => {
                self.tax_rate_percent / (Decimal::ONE_HUNDRED + self.tax_rate_percent)
            }
        };
        gross * self.fee_retention
    }
}

impl Default for VatPolicy {
    fn default() -> Self {
        Self::flat()
    }
}

impl std::str::FromStr for VatPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::flat()),
            "inclusive" => Ok(Self::inclusive()),
            other => Err(CoreError::InvalidVatPolicy(format!(
                "unknown policy '{other}' (expected 'flat' or 'inclusive')"
            ))),
        }
    }
}

/// Converts a product's VND price at `rate` VND per unit of the target
/// currency and attaches the refund figures.
///
/// A missing or non-positive price, or an unusable rate, leaves all three
/// derived fields `None`; every other field passes through unchanged.
#[must_use]
pub fn price(product: CanonicalProduct, rate: f64, policy: &VatPolicy) -> PricedProduct {
    let amounts = product
        .source_currency_price
        .and_then(|vnd| convert_amounts(vnd, rate, policy));

    match amounts {
        Some((converted, refund)) => PricedProduct {
            product,
            converted_price: Some(converted),
            vat_refund_amount: Some(refund),
            final_price: Some(converted - refund),
        },
        None => PricedProduct {
            product,
            converted_price: None,
            vat_refund_amount: None,
            final_price: None,
        },
    }
}

fn convert_amounts(vnd: i64, rate: f64, policy: &VatPolicy) -> Option<(i64, i64)> {
    if vnd <= 0 || !rate.is_finite() || rate <= 0.0 {
        return None;
    }
    let rate = Decimal::from_f64(rate).filter(|r| !r.is_zero())?;
    let converted = Decimal::from(vnd).checked_div(rate)?;
    let refund = converted.checked_mul(policy.refund_factor())?;

    Some((round_whole(converted)?, round_whole(refund)?))
}

fn round_whole(value: Decimal) -> Option<i64> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// A fixed VND offset applied to a retailer's static fallback prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceAdjustment {
    pub retailer: Retailer,
    pub vnd_offset: i64,
}

/// Offsets applied when a retailer is served from its static catalog.
///
/// The catalog prices are already per-retailer, so every offset is zero;
/// this table is the one place to correct a retailer's fallback prices.
pub const STATIC_PRICE_ADJUSTMENTS: &[PriceAdjustment] = &[
    PriceAdjustment {
        retailer: Retailer::FptShop,
        vnd_offset: 0,
    },
    PriceAdjustment {
        retailer: Retailer::ShopDunk,
        vnd_offset: 0,
    },
    PriceAdjustment {
        retailer: Retailer::TopZone,
        vnd_offset: 0,
    },
    PriceAdjustment {
        retailer: Retailer::Cellphones,
        vnd_offset: 0,
    },
];

/// Sum of the offsets `table` declares for `retailer`.
#[must_use]
pub fn static_price_offset(table: &[PriceAdjustment], retailer: Retailer) -> i64 {
    table
        .iter()
        .filter(|a| a.retailer == retailer)
        .fold(0i64, |acc, a| acc.saturating_add(a.vnd_offset))
}

/// Applies `retailer`'s offset from `table` to a static VND price.
#[must_use]
pub fn apply_static_adjustment(
    table: &[PriceAdjustment],
    retailer: Retailer,
    vnd: Option<i64>,
) -> Option<i64> {
    let offset = static_price_offset(table, retailer);
    vnd.map(|p| p.saturating_add(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::{ModelFamily, ScreenSize};

    fn product(vnd: Option<i64>) -> CanonicalProduct {
        CanonicalProduct {
            model: "MacBook Pro 16\"".to_string(),
            model_family: ModelFamily::Pro,
            screen_size: ScreenSize::Inch16,
            chip_category: "M4 Pro".to_string(),
            configuration: "M4 Pro, 24GB RAM, 512GB SSD".to_string(),
            id: "m4-pro-24-512gb".to_string(),
            source_currency_price: vnd,
            url: "https://fptshop.com.vn/may-tinh-xach-tay/apple-macbook".to_string(),
            available: true,
            retailer: Retailer::FptShop,
            is_live: false,
        }
    }

    #[test]
    fn flat_policy_reproduces_reference_figures() {
        let priced = price(product(Some(64_990_000)), 298.0, &VatPolicy::flat());
        assert_eq!(priced.converted_price, Some(218_087));
        assert_eq!(priced.vat_refund_amount, Some(18_537));
        assert_eq!(priced.final_price, Some(199_550));
    }

    #[test]
    fn inclusive_policy_applies_processor_fee() {
        let priced = price(product(Some(64_990_000)), 298.0, &VatPolicy::inclusive());
        assert_eq!(priced.converted_price, Some(218_087));
        assert_eq!(priced.vat_refund_amount, Some(13_326));
        assert_eq!(priced.final_price, Some(204_761));
    }

    #[test]
    fn refund_rounds_from_unrounded_conversion() {
        // 39_990_000 / 25_000 = 1599.6 → 1600; refund 135.966 → 136.
        let priced = price(product(Some(39_990_000)), 25_000.0, &VatPolicy::flat());
        assert_eq!(priced.converted_price, Some(1_600));
        assert_eq!(priced.vat_refund_amount, Some(136));
        assert_eq!(priced.final_price, Some(1_464));
    }

    #[test]
    fn missing_price_leaves_all_derived_fields_empty() {
        let input = product(None);
        let priced = price(input.clone(), 298.0, &VatPolicy::flat());
        assert_eq!(priced.product, input);
        assert!(priced.converted_price.is_none());
        assert!(priced.vat_refund_amount.is_none());
        assert!(priced.final_price.is_none());
    }

    #[test]
    fn unusable_rate_leaves_all_derived_fields_empty() {
        for rate in [0.0, -298.0, f64::NAN, f64::INFINITY] {
            let priced = price(product(Some(64_990_000)), rate, &VatPolicy::flat());
            assert!(priced.converted_price.is_none(), "rate {rate}");
            assert!(priced.vat_refund_amount.is_none(), "rate {rate}");
            assert!(priced.final_price.is_none(), "rate {rate}");
        }
    }

    #[test]
    fn refund_is_bounded_and_final_is_exact_difference() {
        let policies = [VatPolicy::flat(), VatPolicy::inclusive()];
        let prices = [1_000_000, 24_990_000, 39_990_000, 64_990_000, 145_990_000];
        let rates = [297.2, 298.0, 25_000.0, 27_000.0, 311.37];
        for policy in &policies {
            for vnd in prices {
                for rate in rates {
                    let priced = price(product(Some(vnd)), rate, policy);
                    let converted = priced.converted_price.unwrap();
                    let refund = priced.vat_refund_amount.unwrap();
                    let fin = priced.final_price.unwrap();
                    assert!(refund >= 0, "{vnd} @ {rate}");
                    assert!(refund <= converted, "{vnd} @ {rate}");
                    assert_eq!(fin, converted - refund, "{vnd} @ {rate}");
                    assert!(fin <= converted);
                }
            }
        }
    }

    #[test]
    fn policy_rejects_out_of_range_values() {
        let err = VatPolicy::new(Decimal::new(150, 0), RefundMethod::Flat, Decimal::ONE)
            .unwrap_err();
        assert!(err.to_string().contains("tax rate"));

        let err = VatPolicy::new(Decimal::new(10, 0), RefundMethod::Inclusive, Decimal::TWO)
            .unwrap_err();
        assert!(err.to_string().contains("fee retention"));
    }

    #[test]
    fn custom_policy_ten_percent_inclusive() {
        let policy =
            VatPolicy::new(Decimal::TEN, RefundMethod::Inclusive, Decimal::ONE).unwrap();
        // 1_100_000 VND at rate 1 → 1_100_000; 10/110 of it is 100_000.
        let priced = price(product(Some(1_100_000)), 1.0, &policy);
        assert_eq!(priced.vat_refund_amount, Some(100_000));
        assert_eq!(priced.final_price, Some(1_000_000));
    }

    #[test]
    fn policy_parses_from_name() {
        assert_eq!("flat".parse::<VatPolicy>().unwrap(), VatPolicy::flat());
        assert_eq!(
            " Inclusive ".parse::<VatPolicy>().unwrap(),
            VatPolicy::inclusive()
        );
        assert!("average".parse::<VatPolicy>().is_err());
    }

    #[test]
    fn policy_serializes_for_response() {
        let value = serde_json::to_value(VatPolicy::inclusive()).unwrap();
        assert_eq!(value["taxRatePercent"], "8.5");
        assert_eq!(value["method"], "inclusive");
        assert_eq!(value["feeRetention"], "0.78");
    }

    #[test]
    fn default_adjustment_table_is_neutral() {
        for retailer in Retailer::ALL {
            assert_eq!(static_price_offset(STATIC_PRICE_ADJUSTMENTS, retailer), 0);
        }
    }

    #[test]
    fn adjustment_applies_only_to_matching_retailer() {
        let table = [PriceAdjustment {
            retailer: Retailer::TopZone,
            vnd_offset: -500_000,
        }];
        assert_eq!(
            apply_static_adjustment(&table, Retailer::TopZone, Some(59_990_000)),
            Some(59_490_000)
        );
        assert_eq!(
            apply_static_adjustment(&table, Retailer::FptShop, Some(59_990_000)),
            Some(59_990_000)
        );
        assert_eq!(apply_static_adjustment(&table, Retailer::TopZone, None), None);
    }
}
