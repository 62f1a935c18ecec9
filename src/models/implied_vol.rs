use crate::errors::{PricingError, PricingResult};
use crate::models::black_scholes::BlackScholes;
use crate::models::{ContractParams, OptionKind};
use serde::Serialize;

/// Lower edge of the volatility search bracket.
pub const MIN_VOL: f64 = 1e-6;
/// Upper edge of the volatility search bracket (500%).
pub const MAX_VOL: f64 = 5.0;

/// Configuration for the bracketed volatility solver.
///
/// The solve stops when the model price is within `price_tolerance` of the
/// market price, or when the bracket around the root is narrower than
/// `vol_tolerance`. Either way it never runs more than `max_iterations` steps.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub low: f64,
    pub high: f64,
    pub max_iterations: u32,
    /// Absolute price residual accepted as converged.
    pub price_tolerance: f64,
    /// Absolute volatility bracket width accepted as converged.
    pub vol_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            low: MIN_VOL,
            high: MAX_VOL,
            max_iterations: 100,
            price_tolerance: 1e-10,
            vol_tolerance: 2e-12,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds(mut self, low: f64, high: f64) -> Self {
        self.low = low;
        self.high = high;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_price_tolerance(mut self, price_tolerance: f64) -> Self {
        self.price_tolerance = price_tolerance;
        self
    }

    pub fn with_vol_tolerance(mut self, vol_tolerance: f64) -> Self {
        self.vol_tolerance = vol_tolerance;
        self
    }

    fn validate(&self) -> PricingResult<()> {
        if !(self.low.is_finite() && self.high.is_finite() && self.low > 0.0 && self.low < self.high)
        {
            return Err(PricingError::Domain(format!(
                "invalid volatility bracket [{}, {}]",
                self.low, self.high
            )));
        }
        if !(self.price_tolerance >= 0.0 && self.vol_tolerance >= 0.0) {
            return Err(PricingError::Domain("solver tolerances must be non-negative".into()));
        }
        Ok(())
    }
}

/// Converged volatility and the number of solver steps it took.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IvSolution {
    pub vol: f64,
    pub iterations: u32,
}

/// `implied_volatility(market_price, S, K, T, r, kind)` with the default
/// `[1e-6, 5.0]` bracket and a 100-step cap.
pub fn implied_volatility(
    market_price: f64,
    spot: f64,
    strike: f64,
    ttl_years: f64,
    rate: f64,
    kind: &str,
) -> PricingResult<f64> {
    let kind: OptionKind = kind.parse()?;
    implied_volatility_with(
        market_price,
        spot,
        strike,
        ttl_years,
        rate,
        kind,
        &SolverConfig::default(),
    )
    .map(|s| s.vol)
}

/// Finds sigma with price(S, K, T, r, sigma, kind) == market_price inside the
/// configured bracket using Brent's method (inverse quadratic interpolation and
/// secant steps, falling back to bisection whenever those would not shrink the
/// bracket fast enough).
///
/// Fails with `NoRootInBracket` when the price at the bracket edges does not
/// straddle the market price, and with `ConvergenceFailure` when the step cap
/// is reached first.
pub fn implied_volatility_with(
    market_price: f64,
    spot: f64,
    strike: f64,
    ttl_years: f64,
    rate: f64,
    kind: OptionKind,
    config: &SolverConfig,
) -> PricingResult<IvSolution> {
    config.validate()?;
    if !market_price.is_finite() {
        return Err(PricingError::Domain(format!(
            "market price must be finite, got {market_price}"
        )));
    }

    let base = ContractParams::new(spot, strike, ttl_years, rate, config.high, kind)?;
    let objective = |sigma: f64| -> PricingResult<f64> {
        Ok(BlackScholes::price(&base.with_sigma(sigma)?) - market_price)
    };

    let mut a = config.low;
    let mut b = config.high;
    let mut fa = objective(a)?;
    let mut fb = objective(b)?;

    if fa == 0.0 {
        return Ok(IvSolution { vol: a, iterations: 0 });
    }
    if fb == 0.0 {
        return Ok(IvSolution { vol: b, iterations: 0 });
    }
    if fa.signum() == fb.signum() {
        return Err(PricingError::NoRootInBracket {
            market_price,
            low_price: fa + market_price,
            high_price: fb + market_price,
        });
    }

    // c is the contrapoint: [b, c] always brackets the root.
    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for iteration in 1..=config.max_iterations {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        // Keep b as the best estimate.
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * config.vol_tolerance;
        let half_width = 0.5 * (c - b);

        if half_width.abs() <= tol || fb.abs() <= config.price_tolerance {
            return Ok(IvSolution { vol: b, iterations: iteration });
        }

        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                // secant
                (2.0 * half_width * s, 1.0 - s)
            } else {
                // inverse quadratic interpolation
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * half_width * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();

            let min1 = 3.0 * half_width * q - (tol * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = half_width;
                e = d;
            }
        } else {
            d = half_width;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(half_width) };
        fb = objective(b)?;
    }

    Err(PricingError::ConvergenceFailure {
        iterations: config.max_iterations,
        last_vol: b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn market(spot: f64, strike: f64, t: f64, r: f64, vol: f64, kind: OptionKind) -> f64 {
        BlackScholes::price(&ContractParams::new(spot, strike, t, r, vol, kind).unwrap())
    }

    #[test]
    fn test_round_trip_grid() {
        for kind in [OptionKind::Call, OptionKind::Put] {
            for &strike in &[85.0, 95.0, 100.0, 105.0, 115.0] {
                for &vol in &[0.1, 0.2, 0.45, 1.0, 2.5] {
                    let price = market(100.0, strike, 0.5, 0.03, vol, kind);
                    let iv = implied_volatility(price, 100.0, strike, 0.5, 0.03, &kind.to_string())
                        .unwrap_or_else(|e| panic!("K={strike} vol={vol} {kind}: {e}"));
                    assert!(
                        (iv - vol).abs() < TOLERANCE,
                        "K={strike} {kind}: expected {vol}, got {iv}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_reference_scenario_round_trip() {
        let iv = implied_volatility(10.4506, 100.0, 100.0, 1.0, 0.05, "call").unwrap();
        assert!((iv - 0.2).abs() < 1e-4, "iv={iv}");
    }

    #[test]
    fn test_price_above_ceiling_fails() {
        let ceiling = market(100.0, 100.0, 1.0, 0.05, MAX_VOL, OptionKind::Call);
        let err = implied_volatility(ceiling + 1.0, 100.0, 100.0, 1.0, 0.05, "call").unwrap_err();
        match err {
            PricingError::NoRootInBracket {
                market_price,
                high_price,
                ..
            } => {
                assert!((market_price - ceiling - 1.0).abs() < 1e-12);
                assert!((high_price - ceiling).abs() < 1e-9);
            }
            other => panic!("expected NoRootInBracket, got {other:?}"),
        }
    }

    #[test]
    fn test_price_below_floor_fails() {
        // ITM call worth at least S - K*e^(-rT) ~ 14.88
        let err = implied_volatility(5.0, 110.0, 100.0, 1.0, 0.05, "call").unwrap_err();
        assert!(matches!(err, PricingError::NoRootInBracket { .. }));
    }

    #[test]
    fn test_invalid_kind_and_domain() {
        assert!(matches!(
            implied_volatility(5.0, 100.0, 100.0, 1.0, 0.05, "both"),
            Err(PricingError::InvalidOptionKind(_))
        ));
        assert!(matches!(
            implied_volatility(5.0, 100.0, 100.0, 0.0, 0.05, "put"),
            Err(PricingError::Domain(_))
        ));
        assert!(matches!(
            implied_volatility(f64::NAN, 100.0, 100.0, 1.0, 0.05, "put"),
            Err(PricingError::Domain(_))
        ));
    }

    #[test]
    fn test_iteration_cap() {
        let price = market(100.0, 100.0, 1.0, 0.05, 0.2, OptionKind::Call);
        let config = SolverConfig::new()
            .with_max_iterations(2)
            .with_price_tolerance(0.0)
            .with_vol_tolerance(0.0);
        let err = implied_volatility_with(price, 100.0, 100.0, 1.0, 0.05, OptionKind::Call, &config)
            .unwrap_err();
        assert!(
            matches!(err, PricingError::ConvergenceFailure { iterations: 2, .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn test_converges_well_under_cap() {
        let price = market(100.0, 90.0, 0.25, 0.01, 0.35, OptionKind::Put);
        let sol = implied_volatility_with(
            price,
            100.0,
            90.0,
            0.25,
            0.01,
            OptionKind::Put,
            &SolverConfig::default(),
        )
        .unwrap();
        assert!(sol.iterations < 50, "took {} iterations", sol.iterations);
        assert!((sol.vol - 0.35).abs() < TOLERANCE);
    }

    #[test]
    fn test_invalid_bracket() {
        let config = SolverConfig::new().with_bounds(2.0, 1.0);
        let res = implied_volatility_with(5.0, 100.0, 100.0, 1.0, 0.0, OptionKind::Call, &config);
        assert!(matches!(res, Err(PricingError::Domain(_))));
    }
}
