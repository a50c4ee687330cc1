//! Extraction of a VND quote from the converter page's HTML.
//!
//! The page renders the headline quote as text such as `₹1 INR = 297.2 VND`
//! and also embeds a JSON blob with a `"rate": 297.2` field. Both are tried,
//! headline first; the caller applies the plausibility check.

use std::sync::LazyLock;

use regex::Regex;

// The leading `1` must not be the tail of a longer number ("11 INR").
static HEADLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^\d.,])1\s*([a-z]{3})\s*=\s*([\d.,]+)\s*VND")
        .expect("valid headline quote regex")
});

static JSON_RATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""rate"\s*:\s*([\d.]+)"#).expect("valid json rate regex"));

/// Returns the quote candidates found in `html` for `code`→VND, in the order
/// they should be trusted. At most one candidate per pattern.
#[must_use]
pub fn quote_candidates(html: &str, code: &str) -> Vec<f64> {
    let mut candidates = Vec::with_capacity(2);

    if let Some(rate) = headline_quote(html, code) {
        candidates.push(rate);
    }

    if let Some(rate) = JSON_RATE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_number(m.as_str()))
    {
        candidates.push(rate);
    }

    candidates
}

/// Matches `1 <CODE> = <number> VND` for the requested code, optionally
/// prefixed by a currency symbol, case-insensitively.
fn headline_quote(html: &str, code: &str) -> Option<f64> {
    HEADLINE_RE
        .captures_iter(html)
        .find(|caps| caps[1].eq_ignore_ascii_case(code))
        .and_then(|caps| parse_number(&caps[2]))
}

/// Parses `26,345.50` style numbers; commas are thousands separators.
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    cleaned
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headline_quote_with_symbol_prefix() {
        let html = "<h3>₹1 INR = 297.2 VND</h3>";
        assert_eq!(quote_candidates(html, "INR"), vec![297.2]);
    }

    #[test]
    fn headline_quote_with_thousands_separator() {
        let html = "<span>1 USD = 26,345.50 VND</span>";
        assert_eq!(quote_candidates(html, "USD"), vec![26_345.5]);
    }

    #[test]
    fn headline_quote_is_case_insensitive() {
        let html = "€1 eur = 30,120 vnd";
        assert_eq!(quote_candidates(html, "EUR"), vec![30_120.0]);
    }

    #[test]
    fn headline_quote_needs_a_standalone_one() {
        let html = "11 INR = 3,270 VND; ₹1 INR = 297.3 VND";
        assert_eq!(quote_candidates(html, "INR"), vec![297.3]);
    }

    #[test]
    fn headline_quote_at_start_of_text() {
        assert_eq!(quote_candidates("1 EUR = 27,950 VND", "EUR"), vec![27_950.0]);
    }

    #[test]
    fn headline_quote_ignores_other_pairs() {
        let html = "1 USD = 26,345 VND";
        assert!(quote_candidates(html, "INR").is_empty());
    }

    #[test]
    fn json_rate_is_second_candidate() {
        let html = r#"1 INR = 1.5 VND <script>{"source":"INR","rate": 296.85}</script>"#;
        assert_eq!(quote_candidates(html, "INR"), vec![1.5, 296.85]);
    }

    #[test]
    fn no_candidates_in_unrelated_html() {
        assert!(quote_candidates("<html><body>Maintenance</body></html>", "INR").is_empty());
    }

    #[test]
    fn sentence_ending_period_is_not_part_of_number() {
        let html = "Today 1 INR = 297. VND";
        assert_eq!(quote_candidates(html, "INR"), vec![297.0]);
    }
}
