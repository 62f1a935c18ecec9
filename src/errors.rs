/// Error types for the pricing engine.
/// Every error is returned to the immediate caller. Nothing here retries,
/// logs, or substitutes a default value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("invalid option kind: {0:?} (expected \"call\" or \"put\")")]
    InvalidOptionKind(String),

    #[error(
        "no root in volatility bracket: market price {market_price} outside [{low_price}, {high_price}]"
    )]
    NoRootInBracket {
        market_price: f64,
        low_price: f64,
        high_price: f64,
    },

    #[error("solver did not converge after {iterations} iterations, last vol: {last_vol:.6}")]
    ConvergenceFailure { iterations: u32, last_vol: f64 },

    #[error("domain error: {0}")]
    Domain(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for PricingError {
    fn from(e: serde_json::Error) -> Self {
        PricingError::Parse(e.to_string())
    }
}

impl From<std::io::Error> for PricingError {
    fn from(e: std::io::Error) -> Self {
        PricingError::Io(e.to_string())
    }
}

pub type PricingResult<T> = Result<T, PricingError>;
