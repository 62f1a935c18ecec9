use crate::errors::{PricingError, PricingResult};
use crate::integration::grid_len;
use crate::models::black_scholes::BlackScholes;
use crate::models::implied_vol::{implied_volatility_with, SolverConfig};
use crate::models::{ContractParams, OptionKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One option-chain row as handed over by the market-data side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainQuote {
    pub strike: f64,
    #[serde(default)]
    pub last_price: Option<f64>,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
}

/// Which quote field is treated as the market price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    #[default]
    LastTrade,
    /// (bid + ask) / 2, only when both sides are quoted.
    MidPrice,
}

impl FromStr for PriceSource {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last" | "lasttrade" | "last_trade" => Ok(Self::LastTrade),
            "mid" | "midprice" | "mid_price" => Ok(Self::MidPrice),
            other => Err(PricingError::Config(format!("unknown price source: {other}"))),
        }
    }
}

impl ChainQuote {
    /// Positive, finite market price from the chosen source, if any.
    pub fn market_price(&self, source: PriceSource) -> Option<f64> {
        let price = match source {
            PriceSource::LastTrade => self.last_price?,
            PriceSource::MidPrice => {
                let (bid, ask) = (self.bid?, self.ask?);
                if bid <= 0.0 || ask <= 0.0 {
                    return None;
                }
                0.5 * (bid + ask)
            }
        };
        (price.is_finite() && price > 0.0).then_some(price)
    }
}

/// Per-strike output. Analytics are `None` when the strike had no usable
/// price or the solve failed; `note` says which.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrikeAnalytics {
    pub strike: f64,
    pub market_price: Option<f64>,
    pub implied_vol: Option<f64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub note: Option<String>,
}

impl StrikeAnalytics {
    fn skipped(strike: f64, market_price: Option<f64>, note: String) -> Self {
        Self {
            strike,
            market_price,
            implied_vol: None,
            delta: None,
            gamma: None,
            note: Some(note),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.implied_vol.is_some()
    }
}

/// Shared inputs for a strike ladder: everything except strike and price.
#[derive(Debug, Clone, Copy)]
pub struct LadderInputs {
    pub spot: f64,
    pub ttl_years: f64,
    pub rate: f64,
    pub kind: OptionKind,
    pub source: PriceSource,
}

/// Implied vol, delta and gamma for every quote, in input order.
///
/// One bad strike never fails the batch. Only inputs shared by all strikes
/// (spot, T, r) can make the whole call fail.
pub fn analyze_chain(
    inputs: &LadderInputs,
    quotes: &[ChainQuote],
    config: &SolverConfig,
) -> PricingResult<Vec<StrikeAnalytics>> {
    // Validate the shared inputs once, with a placeholder strike and vol.
    ContractParams::new(inputs.spot, inputs.spot, inputs.ttl_years, inputs.rate, 1.0, inputs.kind)?;

    let out: Vec<StrikeAnalytics> = quotes
        .iter()
        .map(|q| analyze_strike(inputs, q, config))
        .collect();

    let solved = out.iter().filter(|a| a.is_complete()).count();
    tracing::debug!(
        strikes = quotes.len(),
        solved,
        kind = %inputs.kind,
        "chain analytics complete"
    );

    Ok(out)
}

fn analyze_strike(inputs: &LadderInputs, quote: &ChainQuote, config: &SolverConfig) -> StrikeAnalytics {
    let Some(price) = quote.market_price(inputs.source) else {
        tracing::debug!(strike = quote.strike, "no market price available for strike");
        return StrikeAnalytics::skipped(quote.strike, None, "no market price available".into());
    };

    let solved = implied_volatility_with(
        price,
        inputs.spot,
        quote.strike,
        inputs.ttl_years,
        inputs.rate,
        inputs.kind,
        config,
    )
    .and_then(|sol| {
        ContractParams::new(
            inputs.spot,
            quote.strike,
            inputs.ttl_years,
            inputs.rate,
            sol.vol,
            inputs.kind,
        )
    });

    match solved {
        Ok(params) => StrikeAnalytics {
            strike: quote.strike,
            market_price: Some(price),
            implied_vol: Some(params.sigma()),
            delta: Some(BlackScholes::delta(&params)),
            gamma: Some(BlackScholes::gamma(&params)),
            note: None,
        },
        Err(e) => {
            tracing::warn!(strike = quote.strike, price, error = %e, "implied vol solve failed");
            StrikeAnalytics::skipped(quote.strike, Some(price), e.to_string())
        }
    }
}

/// Strikes from `start` up to but excluding `end`, `step` apart.
pub fn strike_range(start: f64, end: f64, step: f64) -> PricingResult<Vec<f64>> {
    if !(start.is_finite() && end.is_finite() && step.is_finite() && step > 0.0) {
        return Err(PricingError::Domain(format!(
            "invalid strike range [{start}, {end}) step {step}"
        )));
    }
    let count = grid_len(end - start, step)?;
    Ok((0..count).map(|i| start + i as f64 * step).collect())
}
