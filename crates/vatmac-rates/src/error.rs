use thiserror::Error;

/// Why one step of the rate fallback chain produced no usable value.
///
/// These never reach callers of [`crate::RateResolver::resolve_rate`]; they
/// are logged and the next step is tried.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no rate found in response from {url}")]
    Unparseable { url: String },

    #[error("rate {rate} for {currency} is outside the plausible range ({min}, {max})")]
    OutOfRange {
        currency: String,
        rate: f64,
        min: f64,
        max: f64,
    },

    #[error("rate {rate} for {currency} cannot be used as a divisor")]
    Unusable { currency: String, rate: f64 },

    #[error("no plausible range known for {currency}")]
    UnsupportedCurrency { currency: String },
}
