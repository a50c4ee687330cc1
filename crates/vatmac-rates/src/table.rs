//! Per-currency constants for the VND leg.

/// Rate used for any currency without its own fallback entry.
const DEFAULT_FALLBACK_RATE: f64 = 298.0;

/// Exclusive `(min, max)` bounds a scraped quote must fall inside to be
/// trusted. Codes without an entry skip the quote page entirely.
#[must_use]
pub fn plausible_range(code: &str) -> Option<(f64, f64)> {
    match code {
        "INR" => Some((250.0, 350.0)),
        "USD" => Some((20_000.0, 30_000.0)),
        "EUR" => Some((22_000.0, 35_000.0)),
        _ => None,
    }
}

/// Last-resort VND per unit of `code`. Unrecognized codes get the INR value.
#[must_use]
pub fn static_fallback_rate(code: &str) -> f64 {
    match code {
        "USD" => 25_000.0,
        "EUR" => 27_000.0,
        _ => DEFAULT_FALLBACK_RATE,
    }
}
