use crate::errors::PricingResult;
use crate::models::{ContractParams, OptionKind};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Black-Scholes European option pricing.
///
/// call = S*Phi(d1) - K*e^(-rT)*Phi(d2)
/// put  = K*e^(-rT)*Phi(-d2) - S*Phi(-d1)
///
/// where d1 = (ln(S/K) + (r + sigma^2/2)*T) / (sigma*sqrt(T)) and d2 = d1 - sigma*sqrt(T).
///
/// Stateless: every method is a pure function of one validated snapshot.
pub struct BlackScholes;

impl BlackScholes {
    /// Standard normal CDF.
    #[inline]
    pub fn norm_cdf(x: f64) -> f64 {
        Normal::standard().cdf(x)
    }

    /// Standard normal density.
    #[inline]
    pub fn norm_pdf(x: f64) -> f64 {
        Normal::standard().pdf(x)
    }

    #[inline]
    pub fn d1(params: &ContractParams) -> f64 {
        let half_sigma_sq = 0.5 * params.sigma() * params.sigma();
        (params.ln_s_k() + (params.rate() + half_sigma_sq) * params.ttl_years())
            / params.sigma_sqrt_t()
    }

    #[inline]
    pub fn d2(params: &ContractParams) -> f64 {
        Self::d1(params) - params.sigma_sqrt_t()
    }

    /// Present value of the option described by `params`.
    #[inline]
    pub fn price(params: &ContractParams) -> f64 {
        let d1 = Self::d1(params);
        let d2 = d1 - params.sigma_sqrt_t();
        let pv_strike = params.strike() * params.discount();

        match params.kind() {
            OptionKind::Call => params.spot() * Self::norm_cdf(d1) - pv_strike * Self::norm_cdf(d2),
            OptionKind::Put => pv_strike * Self::norm_cdf(-d2) - params.spot() * Self::norm_cdf(-d1),
        }
    }
}

/// `price(S, K, T, r, sigma, kind)` on raw inputs.
///
/// Fails with `InvalidOptionKind` for a kind other than "call"/"put" and with
/// `Domain` for non-positive S, K, T or sigma.
pub fn price(
    spot: f64,
    strike: f64,
    ttl_years: f64,
    rate: f64,
    sigma: f64,
    kind: &str,
) -> PricingResult<f64> {
    let params = ContractParams::new(spot, strike, ttl_years, rate, sigma, kind.parse()?)?;
    Ok(BlackScholes::price(&params))
}
