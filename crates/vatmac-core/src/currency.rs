//! Target-currency code handling shared by the resolver and the HTTP layer.

/// Currency used when a request does not name one.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Trims and upper-cases a requested currency code, falling back to
/// [`DEFAULT_CURRENCY`] when absent or blank.
#[must_use]
pub fn normalize_currency_code(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| DEFAULT_CURRENCY.to_string(), str::to_ascii_uppercase)
}

/// Display symbol for a target currency. Unknown codes get an empty symbol.
#[must_use]
pub fn currency_symbol(code: &str) -> &'static str {
    match code {
        "INR" => "₹",
        "USD" => "$",
        "EUR" => "€",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_defaults_to_inr() {
        assert_eq!(normalize_currency_code(None), "INR");
        assert_eq!(normalize_currency_code(Some("  ")), "INR");
    }

    #[test]
    fn normalize_uppercases_and_trims() {
        assert_eq!(normalize_currency_code(Some(" usd ")), "USD");
        assert_eq!(normalize_currency_code(Some("eur")), "EUR");
    }

    #[test]
    fn symbol_lookup() {
        assert_eq!(currency_symbol("INR"), "₹");
        assert_eq!(currency_symbol("USD"), "$");
        assert_eq!(currency_symbol("EUR"), "€");
        assert_eq!(currency_symbol("GBP"), "");
    }
}
