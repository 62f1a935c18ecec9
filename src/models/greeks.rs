use crate::errors::PricingResult;
use crate::models::black_scholes::BlackScholes;
use crate::models::{ContractParams, OptionKind};
use serde::Serialize;

/// Spot sensitivities for one snapshot, plus the price they were taken at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Greeks {
    pub price: f64,
    pub delta: f64,
    pub gamma: f64,
}

impl BlackScholes {
    /// dV/dS. Call: Phi(d1). Put: Phi(d1) - 1.
    #[inline]
    pub fn delta(params: &ContractParams) -> f64 {
        let cdf = Self::norm_cdf(Self::d1(params));
        match params.kind() {
            OptionKind::Call => cdf,
            OptionKind::Put => cdf - 1.0,
        }
    }

    /// d2V/dS2 = phi(d1) / (S * sigma * sqrt(T)). Same for calls and puts.
    #[inline]
    pub fn gamma(params: &ContractParams) -> f64 {
        Self::norm_pdf(Self::d1(params)) / (params.spot() * params.sigma_sqrt_t())
    }

    pub fn greeks(params: &ContractParams) -> Greeks {
        Greeks {
            price: Self::price(params),
            delta: Self::delta(params),
            gamma: Self::gamma(params),
        }
    }
}

/// `delta(S, K, T, r, sigma, kind)` on raw inputs.
pub fn delta(
    spot: f64,
    strike: f64,
    ttl_years: f64,
    rate: f64,
    sigma: f64,
    kind: &str,
) -> PricingResult<f64> {
    let params = ContractParams::new(spot, strike, ttl_years, rate, sigma, kind.parse()?)?;
    Ok(BlackScholes::delta(&params))
}

/// `gamma(S, K, T, r, sigma)` on raw inputs. No kind: gamma does not depend on it.
pub fn gamma(spot: f64, strike: f64, ttl_years: f64, rate: f64, sigma: f64) -> PricingResult<f64> {
    let params = ContractParams::new(spot, strike, ttl_years, rate, sigma, OptionKind::Call)?;
    Ok(BlackScholes::gamma(&params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PricingError;

    #[test]
    fn test_reference_scenario() {
        let p = ContractParams::new(100.0, 100.0, 1.0, 0.05, 0.2, OptionKind::Call).unwrap();
        let g = BlackScholes::greeks(&p);
        assert!((g.price - 10.4506).abs() < 1e-3, "price={}", g.price);
        assert!((g.delta - 0.6368).abs() < 1e-3, "delta={}", g.delta);
        assert!((g.gamma - 0.01876).abs() < 1e-3, "gamma={}", g.gamma);
    }

    #[test]
    fn test_delta_bounds_and_gamma_symmetry() {
        for &s in &[60.0, 85.0, 100.0, 115.0, 140.0] {
            for &v in &[0.1, 0.3, 0.8] {
                let call = ContractParams::new(s, 100.0, 0.5, 0.03, v, OptionKind::Call).unwrap();
                let put = call.with_kind(OptionKind::Put);

                let dc = BlackScholes::delta(&call);
                let dp = BlackScholes::delta(&put);
                assert!(dc > 0.0 && dc < 1.0, "call delta {dc} at S={s} v={v}");
                assert!(dp > -1.0 && dp < 0.0, "put delta {dp} at S={s} v={v}");
                assert!((dc - dp - 1.0).abs() < 1e-12);

                let gc = BlackScholes::gamma(&call);
                let gp = BlackScholes::gamma(&put);
                assert!(gc >= 0.0);
                assert_eq!(gc, gp, "gamma must not depend on kind");
            }
        }
    }

    #[test]
    fn test_delta_matches_finite_difference() {
        let p = ContractParams::new(105.0, 100.0, 0.75, 0.02, 0.35, OptionKind::Put).unwrap();
        let h = 1e-4;
        let up = BlackScholes::price(&p.at_spot(105.0 + h).unwrap());
        let down = BlackScholes::price(&p.at_spot(105.0 - h).unwrap());
        let fd_delta = (up - down) / (2.0 * h);
        let fd_gamma = (up - 2.0 * BlackScholes::price(&p) + down) / (h * h);

        assert!((BlackScholes::delta(&p) - fd_delta).abs() < 1e-6);
        assert!((BlackScholes::gamma(&p) - fd_gamma).abs() < 1e-3);
    }

    #[test]
    fn test_raw_inputs() {
        let d = delta(100.0, 100.0, 1.0, 0.05, 0.2, "put").unwrap();
        assert!((d - (0.6368 - 1.0)).abs() < 1e-3);

        let err = delta(100.0, 100.0, 1.0, 0.05, 0.2, "c").unwrap_err();
        assert!(matches!(err, PricingError::InvalidOptionKind(_)));

        let g = gamma(100.0, 100.0, 1.0, 0.05, 0.2).unwrap();
        assert!((g - 0.01876).abs() < 1e-4);

        assert!(matches!(
            gamma(100.0, 100.0, -1.0, 0.05, 0.2),
            Err(PricingError::Domain(_))
        ));
    }
}
