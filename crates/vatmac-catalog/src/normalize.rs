//! Normalization from [`RawProductRecord`] to [`CanonicalProduct`].
//!
//! Model family, screen size and chip are derived from free text with
//! ordered first-match-wins rules. RAM and storage are parsed to build a
//! uniform configuration string for scraped listings.

use std::sync::LazyLock;

use regex::Regex;
use vatmac_core::{CanonicalProduct, ModelFamily, Retailer, ScreenSize};

use crate::loader::static_entry;
use crate::types::RawProductRecord;

/// Maximum id length in characters.
pub const MAX_ID_LEN: usize = 100;

pub const UNKNOWN_CHIP: &str = "Unknown";

/// Chip labels in match order. Each generation lists Max and Pro before the
/// bare chip so `"M4 Pro"` is never classified as `"M4"`.
pub const CHIP_RULES: [&str; 15] = [
    "M5 Max", "M5 Pro", "M5", "M4 Max", "M4 Pro", "M4", "M3 Max", "M3 Pro", "M3", "M2 Max",
    "M2 Pro", "M2", "M1 Max", "M1 Pro", "M1",
];

static CHIP_RULE_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    CHIP_RULES
        .iter()
        .map(|label| {
            let pattern = format!(r"\b{}\b", label.to_lowercase().replace(' ', r"\s*"));
            (Regex::new(&pattern).expect("valid chip rule regex"), *label)
        })
        .collect()
});

// Every digit run, with a trailing capacity or core-count unit captured.
// Runs are matched whole, so "2013" never yields 13, while "13inch", "14in"
// and "pro14" do. Numbers followed by gb/tb/core units are not screen sizes.
static SCREEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)([\s-]*(?:gb|tb|cpu|gpu|core|c\b|g\b))?").expect("valid screen size regex")
});

static RAM_LABELLED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*GB\s*RAM|RAM\s*(\d+)\s*GB").expect("valid RAM regex")
});

// Every capacity token, with trailing SSD/RAM labels captured so callers can
// tell them apart.
static CAPACITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(GB|TB)(\s*SSD)?(\s*RAM)?").expect("valid capacity regex")
});

static STORAGE_TB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*TB").expect("valid TB storage regex"));

static STORAGE_SSD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*GB\s*SSD|SSD\s*(\d+)\s*(GB|TB)").expect("valid SSD storage regex")
});

/// Storage capacity parsed from a listing name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Storage {
    pub gb: u32,
    /// `"512GB"` or `"1TB"`.
    pub display: String,
}

/// Hardware specs parsed from free text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Specs {
    pub ram_gb: Option<u32>,
    pub storage: Option<Storage>,
}

/// Normalizes one record. Infallible: anything undeterminable gets a
/// neutral default (`Generic` family, unknown size, `"Unknown"` chip).
#[must_use]
pub fn normalize(raw: RawProductRecord) -> CanonicalProduct {
    let (model_family, screen_size) = classify_model(&raw.model);

    let name = raw.raw_name.as_deref().unwrap_or(&raw.model);
    let chip_category = chip_from_hints(raw.chip.as_deref(), raw.chip_variant.as_deref())
        .or_else(|| {
            let text = format!(
                "{} {} {}",
                raw.model,
                raw.raw_name.as_deref().unwrap_or_default(),
                raw.configuration.as_deref().unwrap_or_default()
            );
            classify_chip(&text).map(str::to_owned)
        })
        .unwrap_or_else(|| UNKNOWN_CHIP.to_owned());

    let configuration = match raw.configuration {
        Some(configuration) => configuration,
        None => describe_configuration(&chip_category, &parse_specs(name))
            .unwrap_or_else(|| name.to_owned()),
    };

    let id = match raw.id {
        Some(id) if !id.trim().is_empty() => id,
        _ => slugify(&configuration),
    };

    let url = raw
        .url
        .unwrap_or_else(|| fallback_url(raw.retailer, &id).to_owned());

    let model = match screen_size {
        ScreenSize::Unknown => model_family.as_str().to_owned(),
        size => format!("{} {}", model_family.as_str(), size.as_str()),
    };

    CanonicalProduct {
        model,
        model_family,
        screen_size,
        chip_category,
        configuration,
        id,
        source_currency_price: raw.price_vnd,
        url,
        available: raw.available.unwrap_or(true),
        retailer: raw.retailer,
        is_live: raw.is_live,
    }
}

/// Family from `air`/`pro` keywords; size only from the sizes that family
/// ships in (Air 13/15, Pro 14/16). Everything else is generic and unsized.
#[must_use]
pub fn classify_model(model: &str) -> (ModelFamily, ScreenSize) {
    let lower = model.to_lowercase();

    let (family, allowed): (ModelFamily, &[(&str, ScreenSize)]) = if lower.contains("air") {
        (
            ModelFamily::Air,
            &[("13", ScreenSize::Inch13), ("15", ScreenSize::Inch15)],
        )
    } else if lower.contains("pro") {
        (
            ModelFamily::Pro,
            &[("14", ScreenSize::Inch14), ("16", ScreenSize::Inch16)],
        )
    } else {
        return (ModelFamily::Generic, ScreenSize::Unknown);
    };

    let size = SCREEN_RE
        .captures_iter(&lower)
        .filter(|caps| caps.get(2).is_none())
        .filter_map(|caps| caps.get(1))
        .find_map(|m| {
            allowed
                .iter()
                .find(|(digits, _)| *digits == m.as_str())
                .map(|(_, size)| *size)
        })
        .unwrap_or(ScreenSize::Unknown);

    (family, size)
}

/// Label from structured hints: `("m5", "pro")` → `"M5 Pro"`.
#[must_use]
pub fn chip_from_hints(chip: Option<&str>, variant: Option<&str>) -> Option<String> {
    let chip = chip.map(str::trim).filter(|c| !c.is_empty())?.to_uppercase();
    match variant.map(str::trim).filter(|v| !v.is_empty()) {
        Some(variant) => Some(format!("{chip} {}", title_case(variant))),
        None => Some(chip),
    }
}

/// First chip rule matching `text` (whitespace-collapsed, case-insensitive).
#[must_use]
pub fn classify_chip(text: &str) -> Option<&'static str> {
    let collapsed = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    CHIP_RULE_RES
        .iter()
        .find(|(re, _)| re.is_match(&collapsed))
        .map(|(_, label)| *label)
}

/// Parses RAM and storage from a listing name.
///
/// RAM: an explicit `NGB RAM` / `RAM NGB`, else the first GB figure not
/// labelled SSD. Storage: any TB figure, else an explicit SSD figure, else
/// the last unlabelled capacity. Without a RAM label that capacity must not be
/// the only one (`"24GB 512GB"`); with one it may (`"24GB RAM 512GB"`).
#[must_use]
pub fn parse_specs(text: &str) -> Specs {
    Specs {
        ram_gb: parse_ram(text),
        storage: parse_storage(text),
    }
}

fn parse_ram(text: &str) -> Option<u32> {
    if let Some(caps) = RAM_LABELLED_RE.captures(text) {
        return caps
            .get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse().ok());
    }
    CAPACITY_RE
        .captures_iter(text)
        .find(|caps| caps[2].eq_ignore_ascii_case("gb") && caps.get(3).is_none())
        .and_then(|caps| caps[1].parse().ok())
}

fn parse_storage(text: &str) -> Option<Storage> {
    if let Some(tb) = STORAGE_TB_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
    {
        return Some(storage_from(tb, true));
    }

    if let Some(caps) = STORAGE_SSD_RE.captures(text) {
        if let Some(gb) = caps.get(1) {
            return gb.as_str().parse().ok().map(|v| storage_from(v, false));
        }
        let is_tb = caps.get(3).is_some_and(|u| u.as_str().eq_ignore_ascii_case("tb"));
        return caps
            .get(2)
            .and_then(|v| v.as_str().parse().ok())
            .map(|v| storage_from(v, is_tb));
    }

    // With RAM labelled, every remaining capacity outside that label is a
    // storage candidate; otherwise the first capacity is taken to be RAM.
    let ram_label = RAM_LABELLED_RE.find(text).map(|m| m.range());
    let unlabelled: Vec<_> = CAPACITY_RE
        .captures_iter(text)
        .filter(|caps| caps.get(4).is_none())
        .filter(|caps| {
            let start = caps.get(0).map_or(0, |m| m.start());
            ram_label
                .as_ref()
                .is_none_or(|range| !range.contains(&start))
        })
        .collect();
    let needed = if ram_label.is_some() { 1 } else { 2 };
    if unlabelled.len() < needed {
        return None;
    }
    let last = unlabelled.last()?;
    let value = last[1].parse().ok()?;
    Some(storage_from(value, last[2].eq_ignore_ascii_case("tb")))
}

fn storage_from(value: u32, is_tb: bool) -> Storage {
    if is_tb {
        Storage {
            gb: value.saturating_mul(1024),
            display: format!("{value}TB"),
        }
    } else {
        Storage {
            gb: value,
            display: format!("{value}GB"),
        }
    }
}

/// `"M4 Pro, 24GB RAM, 512GB SSD"`, when chip, RAM and storage are all known.
fn describe_configuration(chip: &str, specs: &Specs) -> Option<String> {
    if chip == UNKNOWN_CHIP {
        return None;
    }
    let ram = specs.ram_gb?;
    let storage = specs.storage.as_ref()?;
    Some(format!("{chip}, {ram}GB RAM, {} SSD", storage.display))
}

/// Lower-case slug with runs of non-alphanumerics collapsed to `-`,
/// truncated to [`MAX_ID_LEN`] characters.
#[must_use]
pub fn slugify(text: &str) -> String {
    let slug = text
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let truncated: String = slug.chars().take(MAX_ID_LEN).collect();
    truncated.trim_end_matches('-').to_owned()
}

/// Link for a record without one: the static entry with the same id at the
/// same retailer, else the retailer's MacBook category page.
fn fallback_url(retailer: Retailer, id: &str) -> &'static str {
    static_entry(retailer, id).map_or_else(|| retailer.category_url(), |e| e.url.as_str())
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
