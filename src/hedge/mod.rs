//! Stock + option hedge profit profile.
//!
//! The option leg is repriced across a spot grid with the linear delta
//! projection
//!
//!   option(S) = market_price + delta(S) * (S - S0)
//!
//! where delta(S) is the Black-Scholes delta at grid spot S and the implied vol.
//! Total profit per grid spot:
//!
//!   (S - S0) * shares + (option(S) - market_price) * contracts * CONTRACT_MULTIPLIER

use crate::errors::{PricingError, PricingResult};
use crate::integration::grid_len;
use crate::models::black_scholes::BlackScholes;
use crate::models::ContractParams;
use serde::Serialize;
use smallvec::SmallVec;

/// Shares of underlying per listed option contract.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

#[derive(Debug, Clone, Copy)]
pub struct HedgePosition {
    /// Option contract at the current spot S0, priced with its implied vol.
    pub contract: ContractParams,
    /// Observed option price at S0.
    pub market_price: f64,
    pub shares: f64,
    pub contracts: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfitPoint {
    pub spot: f64,
    pub option_price: f64,
    pub total_profit: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfitProfile {
    pub points: Vec<ProfitPoint>,
    /// Up to two spots where total profit changes sign, ascending.
    pub breakevens: SmallVec<[f64; 2]>,
}

/// Profit profile over the grid `[S0 - half_width, S0 + half_width)` with `step`.
pub fn profit_profile(
    position: &HedgePosition,
    half_width: f64,
    step: f64,
) -> PricingResult<ProfitProfile> {
    if !(half_width.is_finite() && half_width > 0.0 && step.is_finite() && step > 0.0) {
        return Err(PricingError::Domain(format!(
            "invalid hedge grid: half width {half_width}, step {step}"
        )));
    }
    if !(position.market_price.is_finite()
        && position.shares.is_finite()
        && position.contracts.is_finite())
    {
        return Err(PricingError::Domain("hedge position values must be finite".into()));
    }

    let s0 = position.contract.spot();
    let start = s0 - half_width;
    let count = grid_len(2.0 * half_width, step)?;

    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let spot = start + i as f64 * step;
        let delta = BlackScholes::delta(&position.contract.at_spot(spot)?);
        let option_price = position.market_price + delta * (spot - s0);

        let stock_pnl = (spot - s0) * position.shares;
        let option_pnl =
            (option_price - position.market_price) * position.contracts * CONTRACT_MULTIPLIER;

        points.push(ProfitPoint {
            spot,
            option_price,
            total_profit: stock_pnl + option_pnl,
        });
    }

    let breakevens = find_breakevens(&points);
    if breakevens.len() < 2 {
        tracing::debug!(found = breakevens.len(), "profit-positive range not fully bracketed");
    }

    Ok(ProfitProfile { points, breakevens })
}

/// First two sign changes of total profit, scanning ascending.
/// Going down through zero keeps the left sample; going up keeps the right one.
fn find_breakevens(points: &[ProfitPoint]) -> SmallVec<[f64; 2]> {
    let mut found: SmallVec<[f64; 2]> = SmallVec::new();
    for w in points.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);
        if prev.total_profit >= 0.0 && cur.total_profit <= 0.0 {
            found.push(prev.spot);
        } else if prev.total_profit <= 0.0 && cur.total_profit >= 0.0 {
            found.push(cur.spot);
        }
        if found.len() >= 2 {
            break;
        }
    }
    found.sort_by(f64::total_cmp);
    found
}

/// Option contracts whose price move offsets the stock loss between two prices.
///
/// contracts = -(stock_end - stock_start) * shares / (option_end - option_start)
pub fn contracts_to_offset(
    stock_start: f64,
    stock_end: f64,
    shares: f64,
    option_start: f64,
    option_end: f64,
) -> PricingResult<f64> {
    let option_move = option_end - option_start;
    if option_move == 0.0 || !option_move.is_finite() {
        return Err(PricingError::Domain(format!(
            "option price move must be non-zero and finite, got {option_move}"
        )));
    }
    let stock_pnl = (stock_end - stock_start) * shares;
    Ok(-stock_pnl / option_move)
}
