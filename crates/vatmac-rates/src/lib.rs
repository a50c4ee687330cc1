pub mod error;
pub mod parse;
pub mod resolver;
pub mod table;

pub use error::RateError;
pub use resolver::{RateResolver, RateSource, ResolvedRate};
pub use table::{plausible_range, static_fallback_rate};
