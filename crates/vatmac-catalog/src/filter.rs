//! Validity rules for scraped listings.
//!
//! Static catalog entries are curated and never pass through here.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::RawProductRecord;

/// Listings priced below this are accessories, deposits or parse errors.
pub const MIN_VALID_PRICE_VND: i64 = 1_000_000;

// Non-new condition markers, Vietnamese and English. Word boundaries are
// Unicode-aware, so `cũ` does not match inside `cũng`.
static NON_NEW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:cũ|đã\s+qua\s+sử\s+dụng|trưng\s+bày|used|like\s+new|refurbished|renewed|trade[\s-]?in|open[\s-]?box)\b",
    )
    .expect("valid condition marker regex")
});

/// `true` when `text` carries a used/refurbished/display-unit marker.
#[must_use]
pub fn has_non_new_marker(text: &str) -> bool {
    NON_NEW_RE.is_match(text)
}

/// Whether a scraped record may be shown: new condition and a plausible
/// price. Pure; the record is not modified.
#[must_use]
pub fn is_valid(record: &RawProductRecord) -> bool {
    let texts = [
        Some(record.model.as_str()),
        record.raw_name.as_deref(),
        record.condition.as_deref(),
    ];
    if texts.into_iter().flatten().any(has_non_new_marker) {
        return false;
    }
    record
        .price_vnd
        .is_some_and(|price| price >= MIN_VALID_PRICE_VND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vatmac_core::Retailer;

    fn record(model: &str, price_vnd: Option<i64>) -> RawProductRecord {
        RawProductRecord {
            model: model.to_owned(),
            raw_name: None,
            chip: None,
            chip_variant: None,
            configuration: None,
            id: None,
            price_vnd,
            url: None,
            retailer: Retailer::Cellphones,
            condition: None,
            available: None,
            is_live: true,
        }
    }

    #[test]
    fn new_listing_with_price_is_valid() {
        assert!(is_valid(&record("MacBook Air 13 M3 8GB 256GB", Some(24_990_000))));
    }

    #[test]
    fn price_below_threshold_is_rejected() {
        assert!(!is_valid(&record("MacBook Air 13 M3 8GB 256GB", Some(500_000))));
        assert!(!is_valid(&record("MacBook Air 13 M3 8GB 256GB", Some(999_999))));
        assert!(is_valid(&record("MacBook Air 13 M3 8GB 256GB", Some(1_000_000))));
    }

    #[test]
    fn missing_price_is_rejected() {
        assert!(!is_valid(&record("MacBook Air 13 M3 8GB 256GB", None)));
    }

    #[test]
    fn used_marker_rejects_even_with_valid_price() {
        assert!(!is_valid(&record("MacBook Pro 14 M3 Pro cũ", Some(35_000_000))));
        assert!(!is_valid(&record("MacBook Air M2 (Used)", Some(15_000_000))));
    }

    #[test]
    fn marker_in_raw_name_or_condition_rejects() {
        let mut r = record("MacBook Air M2", Some(15_000_000));
        r.raw_name = Some("MacBook Air M2 - Đã qua sử dụng".to_owned());
        assert!(!is_valid(&r));

        let mut r = record("MacBook Air M2", Some(15_000_000));
        r.condition = Some("Like New 99%".to_owned());
        assert!(!is_valid(&r));
    }

    #[test]
    fn english_and_vietnamese_markers() {
        for text in [
            "Refurbished MacBook",
            "renewed",
            "Trade-in offer",
            "trade in",
            "Open box",
            "open-box",
            "Máy trưng bày",
            "Hàng cũ",
        ] {
            assert!(has_non_new_marker(text), "{text}");
        }
    }

    #[test]
    fn markers_need_word_boundaries() {
        for text in [
            "MacBook Air M3 - cũng là lựa chọn tốt",
            "Unused stock",
            "Users love it",
            "MacBook Pro M4 Pro 24GB",
        ] {
            assert!(!has_non_new_marker(text), "{text}");
        }
    }

    #[test]
    fn filter_does_not_modify_record() {
        let r = record("MacBook Air M2 cũ", Some(15_000_000));
        let before = r.clone();
        let _ = is_valid(&r);
        assert_eq!(r, before);
    }
}
