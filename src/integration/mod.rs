//! Price-curve reconstruction by accumulating spot sensitivities.
//!
//! All three curves share one sampling scheme: `SAMPLE_POINTS` evenly spaced spots
//! from `start` to `end` inclusive. Accumulation uses the left-endpoint (Euler)
//! rule, `v[i] = v[i-1] + g(S[i-1]) * (S[i] - S[i-1])`. The discretization error
//! of that rule is part of the expected output and must not be "fixed" with a
//! trapezoid or a closed form.

use crate::errors::{PricingError, PricingResult};
use crate::models::black_scholes::BlackScholes;
use crate::models::ContractParams;
use serde::Serialize;

/// Number of spots every curve is sampled at.
pub const SAMPLE_POINTS: usize = 100;

/// Upper bound on points in any stepped grid (hedge spots, strike ladders).
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// Lowest curve start, as a fraction of the centre spot.
pub const MIN_SPOT_FRACTION: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub spot: f64,
    pub value: f64,
}

/// Ordered (spot, value) samples, in the order the spots were generated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampledCurve {
    pub points: Vec<CurvePoint>,
}

impl SampledCurve {
    fn from_parts(spots: &[f64], values: Vec<f64>) -> Self {
        let points = spots
            .iter()
            .zip(values)
            .map(|(&spot, value)| CurvePoint { spot, value })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn spots(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.spot)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    pub fn first(&self) -> Option<&CurvePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&CurvePoint> {
        self.points.last()
    }
}

/// `count` evenly spaced values from `start` to `end`, both included.
/// The last sample is pinned to `end` so rounding never overshoots it.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            let mut out: Vec<f64> = (0..count).map(|i| start + i as f64 * step).collect();
            out[count - 1] = end;
            out
        }
    }
}

/// The shared spot partition for all integrators.
pub fn sample_spots(start: f64, end: f64) -> PricingResult<Vec<f64>> {
    if !(start.is_finite() && end.is_finite()) {
        return Err(PricingError::Domain(format!(
            "spot range must be finite, got [{start}, {end}]"
        )));
    }
    Ok(linspace(start, end, SAMPLE_POINTS))
}

/// Number of `step`-spaced points covering `[0, span)`. Rejects grids larger
/// than `MAX_GRID_POINTS`.
pub fn grid_len(span: f64, step: f64) -> PricingResult<usize> {
    let count = (span / step).ceil().max(0.0);
    if !count.is_finite() || count > MAX_GRID_POINTS as f64 {
        return Err(PricingError::Domain(format!(
            "grid of span {span} with step {step} exceeds {MAX_GRID_POINTS} points"
        )));
    }
    Ok(count as usize)
}

/// `[center - half_width, center + half_width]`, with the lower edge raised to
/// `center * MIN_SPOT_FRACTION` when it would reach zero or below.
pub fn spot_window(center: f64, half_width: f64) -> PricingResult<(f64, f64)> {
    if !(center.is_finite() && center > 0.0 && half_width.is_finite() && half_width >= 0.0) {
        return Err(PricingError::Domain(format!(
            "invalid spot window: center {center}, half width {half_width}"
        )));
    }
    let start = (center - half_width).max(center * MIN_SPOT_FRACTION);
    Ok((start, center + half_width))
}

/// Running left-endpoint sum: out[0] = seed, out[i] = out[i-1] + slope[i-1] * dS.
fn accumulate(spots: &[f64], slopes: &[f64], seed: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(spots.len());
    out.push(seed);
    for i in 1..spots.len() {
        let ds = spots[i] - spots[i - 1];
        out.push(out[i - 1] + slopes[i - 1] * ds);
    }
    out
}

/// Evaluates `f` on `contract` moved to every sampled spot.
fn sample_with<F>(contract: &ContractParams, spots: &[f64], f: F) -> PricingResult<Vec<f64>>
where
    F: Fn(&ContractParams) -> f64,
{
    spots
        .iter()
        .map(|&s| contract.at_spot(s).map(|p| f(&p)))
        .collect()
}

/// Price curve over `[start, end]` reconstructed from delta, seeded with the
/// closed-form price at `start`. The spot of `contract` is ignored; every
/// other input is held fixed.
pub fn integrate_delta(start: f64, end: f64, contract: &ContractParams) -> PricingResult<SampledCurve> {
    integrate_delta_stress(start, end, contract, 0.0)
}

/// Same as [`integrate_delta`] with every delta reduced by `stress_val`
/// before it is applied to the step. `stress_val == 0` is the unstressed curve.
pub fn integrate_delta_stress(
    start: f64,
    end: f64,
    contract: &ContractParams,
    stress_val: f64,
) -> PricingResult<SampledCurve> {
    if !stress_val.is_finite() {
        return Err(PricingError::Domain(format!(
            "stress value must be finite, got {stress_val}"
        )));
    }

    let spots = sample_spots(start, end)?;
    let deltas = sample_with(contract, &spots, |p| BlackScholes::delta(p) - stress_val)?;
    let seed = BlackScholes::price(&contract.at_spot(start)?);

    Ok(SampledCurve::from_parts(&spots, accumulate(&spots, &deltas, seed)))
}

/// Price curve reconstructed by integrating gamma twice.
///
/// Pass one rebuilds delta from gamma, seeded with the analytic delta at `start`.
/// Pass two rebuilds price from that reconstructed delta, seeded with the analytic
/// price at `start`. Error from the first pass carries into the second.
pub fn integrate_gamma(start: f64, end: f64, contract: &ContractParams) -> PricingResult<SampledCurve> {
    let spots = sample_spots(start, end)?;
    let gammas = sample_with(contract, &spots, BlackScholes::gamma)?;

    let at_start = contract.at_spot(start)?;
    let deltas = accumulate(&spots, &gammas, BlackScholes::delta(&at_start));
    let prices = accumulate(&spots, &deltas, BlackScholes::price(&at_start));

    Ok(SampledCurve::from_parts(&spots, prices))
}

/// Closed-form price at every sampled spot. Reference curve for the integrators.
pub fn exact_prices(start: f64, end: f64, contract: &ContractParams) -> PricingResult<SampledCurve> {
    let spots = sample_spots(start, end)?;
    let prices = sample_with(contract, &spots, BlackScholes::price)?;
    Ok(SampledCurve::from_parts(&spots, prices))
}
