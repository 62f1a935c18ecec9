pub mod black_scholes;
pub mod greeks;
pub mod implied_vol;

use crate::errors::{PricingError, PricingResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// European option kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

impl FromStr for OptionKind {
    type Err = PricingError;

    /// Accepts exactly "call" or "put" (case-insensitive). No default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(Self::Call),
            "put" => Ok(Self::Put),
            _ => Err(PricingError::InvalidOptionKind(s.to_string())),
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

/// One immutable snapshot of the six Black-Scholes inputs.
///
/// Construction validates the domain (S, K, T, sigma strictly positive and finite,
/// r finite) so nothing downstream can produce NaN/Inf from degenerate inputs.
/// The shared subexpressions of d1 are precomputed once per snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContractParams {
    spot: f64,
    strike: f64,
    ttl_years: f64,
    rate: f64,
    sigma: f64,
    kind: OptionKind,
    // Precomputed
    #[serde(skip)]
    ln_s_k: f64,
    #[serde(skip)]
    sigma_sqrt_t: f64,
    #[serde(skip)]
    discount: f64,
}

impl ContractParams {
    pub fn new(
        spot: f64,
        strike: f64,
        ttl_years: f64,
        rate: f64,
        sigma: f64,
        kind: OptionKind,
    ) -> PricingResult<Self> {
        require_positive("spot", spot)?;
        require_positive("strike", strike)?;
        require_positive("time to expiry", ttl_years)?;
        require_positive("volatility", sigma)?;
        if !rate.is_finite() {
            return Err(PricingError::Domain(format!(
                "risk-free rate must be finite, got {rate}"
            )));
        }

        Ok(Self {
            spot,
            strike,
            ttl_years,
            rate,
            sigma,
            kind,
            ln_s_k: (spot / strike).ln(),
            sigma_sqrt_t: sigma * ttl_years.sqrt(),
            discount: (-rate * ttl_years).exp(),
        })
    }

    /// Same contract, different spot. Re-validated.
    #[inline]
    pub fn at_spot(&self, spot: f64) -> PricingResult<Self> {
        Self::new(spot, self.strike, self.ttl_years, self.rate, self.sigma, self.kind)
    }

    /// Same contract, different volatility. Re-validated.
    #[inline]
    pub fn with_sigma(&self, sigma: f64) -> PricingResult<Self> {
        Self::new(self.spot, self.strike, self.ttl_years, self.rate, sigma, self.kind)
    }

    /// Same contract with the opposite kind (call <-> put).
    #[inline]
    pub fn with_kind(&self, kind: OptionKind) -> Self {
        Self { kind, ..*self }
    }

    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    #[inline]
    pub fn strike(&self) -> f64 {
        self.strike
    }

    #[inline]
    pub fn ttl_years(&self) -> f64 {
        self.ttl_years
    }

    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    #[inline]
    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    /// ln(S/K)
    #[inline]
    pub fn ln_s_k(&self) -> f64 {
        self.ln_s_k
    }

    /// sigma * sqrt(T)
    #[inline]
    pub fn sigma_sqrt_t(&self) -> f64 {
        self.sigma_sqrt_t
    }

    /// e^(-rT)
    #[inline]
    pub fn discount(&self) -> f64 {
        self.discount
    }
}

fn require_positive(name: &str, value: f64) -> PricingResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PricingError::Domain(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}
