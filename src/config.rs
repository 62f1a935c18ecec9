use crate::chain::PriceSource;
use crate::errors::{PricingError, PricingResult};
use crate::models::OptionKind;
use crate::rates::{days_to_expiry, year_fraction, RateCurve};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Where the risk-free rate comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateInput {
    /// A single annual rate (fraction).
    Flat(f64),
    /// Published yield points; the tenor bucket of the expiry is used.
    Curve(RateCurve),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub spot: f64,
    pub strike: f64,
    pub kind: OptionKind,
    /// Calendar days to expiry, resolved against today's date when
    /// `EXPIRY_DATE` was given.
    pub days_to_expiry: i64,
    pub rate: RateInput,
    pub volatility: Option<f64>,
    pub market_price: Option<f64>,
    pub curve_half_width: f64,
    pub stress_val: f64,
    pub chain_file: Option<PathBuf>,
    pub price_source: PriceSource,
    pub hedge_shares: f64,
    pub hedge_contracts: f64,
    pub hedge_half_width: f64,
    pub hedge_step: f64,
}

impl AppConfig {
    pub fn from_env() -> PricingResult<Self> {
        dotenvy::dotenv().ok();
        let today = chrono::Local::now().date_naive();
        Self::from_lookup(&|key| std::env::var(key).ok(), today)
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(vars: Lookup<'_>, today: NaiveDate) -> PricingResult<Self> {
        let spot = parse_f64("SPOT", &env_var(vars, "SPOT")?)?;
        let strike = parse_f64("STRIKE", &env_var(vars, "STRIKE")?)?;
        let kind = env_var_or(vars, "OPTION_KIND", "call")
            .parse::<OptionKind>()
            .map_err(|e| PricingError::Config(format!("OPTION_KIND: {e}")))?;

        let days_to_expiry = match (env_opt(vars, "DAYS_TO_EXPIRY"), env_opt(vars, "EXPIRY_DATE")) {
            (Some(days), _) => days
                .trim()
                .parse::<i64>()
                .map_err(|e| PricingError::Config(format!("DAYS_TO_EXPIRY: {e}")))?,
            (None, Some(date)) => {
                let expiry = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
                    .map_err(|e| PricingError::Config(format!("EXPIRY_DATE: {e}")))?;
                days_to_expiry(today, expiry)
            }
            (None, None) => {
                return Err(PricingError::Config(
                    "missing env var: DAYS_TO_EXPIRY or EXPIRY_DATE".into(),
                ))
            }
        };

        let rate = match env_opt(vars, "RISK_FREE_RATE") {
            Some(r) => RateInput::Flat(parse_f64("RISK_FREE_RATE", &r)?),
            None => RateInput::Curve(RateCurve::from_percentages(
                parse_f64("RATE_3M", &env_var(vars, "RATE_3M")?)?,
                parse_f64("RATE_6M", &env_var(vars, "RATE_6M")?)?,
                parse_f64("RATE_1Y", &env_var(vars, "RATE_1Y")?)?,
                parse_f64("RATE_5Y", &env_var(vars, "RATE_5Y")?)?,
                parse_f64("RATE_10Y", &env_var(vars, "RATE_10Y")?)?,
            )?),
        };

        let volatility = env_opt(vars, "VOLATILITY")
            .map(|v| parse_f64("VOLATILITY", &v))
            .transpose()?;
        let market_price = env_opt(vars, "MARKET_PRICE")
            .map(|v| parse_f64("MARKET_PRICE", &v))
            .transpose()?;
        if volatility.is_none() && market_price.is_none() {
            return Err(PricingError::Config(
                "one of VOLATILITY or MARKET_PRICE is required".into(),
            ));
        }

        let price_source = env_var_or(vars, "PRICE_SOURCE", "last")
            .parse::<PriceSource>()
            .map_err(|e| PricingError::Config(format!("PRICE_SOURCE: {e}")))?;

        Ok(Self {
            spot,
            strike,
            kind,
            days_to_expiry,
            rate,
            volatility,
            market_price,
            curve_half_width: parse_f64("CURVE_HALF_WIDTH", &env_var_or(vars, "CURVE_HALF_WIDTH", "20"))?,
            stress_val: parse_f64("STRESS_VAL", &env_var_or(vars, "STRESS_VAL", "0"))?,
            chain_file: env_opt(vars, "CHAIN_FILE").map(PathBuf::from),
            price_source,
            hedge_shares: parse_f64("HEDGE_SHARES", &env_var_or(vars, "HEDGE_SHARES", "20"))?,
            hedge_contracts: parse_f64("HEDGE_CONTRACTS", &env_var_or(vars, "HEDGE_CONTRACTS", "1"))?,
            hedge_half_width: parse_f64("HEDGE_HALF_WIDTH", &env_var_or(vars, "HEDGE_HALF_WIDTH", "15"))?,
            hedge_step: parse_f64("HEDGE_STEP", &env_var_or(vars, "HEDGE_STEP", "0.01"))?,
        })
    }

    pub fn ttl_years(&self) -> f64 {
        year_fraction(self.days_to_expiry)
    }

    /// Annual risk-free rate for this expiry.
    pub fn risk_free_rate(&self) -> f64 {
        match self.rate {
            RateInput::Flat(r) => r,
            RateInput::Curve(curve) => curve.rate_for_years(self.ttl_years()),
        }
    }
}

pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn env_opt(vars: Lookup<'_>, key: &str) -> Option<String> {
    vars(key).filter(|v| !v.trim().is_empty())
}

fn env_var(vars: Lookup<'_>, key: &str) -> PricingResult<String> {
    env_opt(vars, key).ok_or_else(|| PricingError::Config(format!("missing env var: {key}")))
}

fn env_var_or(vars: Lookup<'_>, key: &str, default: &str) -> String {
    env_opt(vars, key).unwrap_or_else(|| default.to_string())
}

fn parse_f64(key: &str, raw: &str) -> PricingResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| PricingError::Config(format!("{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 18).unwrap()
    }

    fn load(pairs: &[(&str, &str)]) -> PricingResult<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(&|key| map.get(key).cloned(), today())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("SPOT", "120"),
        ("STRIKE", "115"),
        ("DAYS_TO_EXPIRY", "30"),
        ("RISK_FREE_RATE", "0.05"),
        ("VOLATILITY", "0.5"),
    ];

    #[test]
    fn test_defaults() {
        let cfg = load(MINIMAL).unwrap();
        assert_eq!(cfg.kind, OptionKind::Call);
        assert_eq!(cfg.days_to_expiry, 30);
        assert!((cfg.ttl_years() - 30.0 / 365.0).abs() < 1e-15);
        assert_eq!(cfg.risk_free_rate(), 0.05);
        assert_eq!(cfg.market_price, None);
        assert_eq!(cfg.curve_half_width, 20.0);
        assert_eq!(cfg.stress_val, 0.0);
        assert_eq!(cfg.price_source, PriceSource::LastTrade);
        assert!(cfg.chain_file.is_none());
        assert_eq!(cfg.hedge_shares, 20.0);
        assert_eq!(cfg.hedge_contracts, 1.0);
        assert_eq!(cfg.hedge_half_width, 15.0);
        assert_eq!(cfg.hedge_step, 0.01);
    }

    #[test]
    fn test_missing_required() {
        let err = load(&MINIMAL[1..]).unwrap_err();
        assert_eq!(err, PricingError::Config("missing env var: SPOT".into()));

        let no_expiry: Vec<_> = MINIMAL.iter().copied().filter(|(k, _)| *k != "DAYS_TO_EXPIRY").collect();
        assert!(load(&no_expiry).unwrap_err().to_string().contains("EXPIRY_DATE"));

        let no_vol: Vec<_> = MINIMAL.iter().copied().filter(|(k, _)| *k != "VOLATILITY").collect();
        assert!(load(&no_vol).unwrap_err().to_string().contains("MARKET_PRICE"));
    }

    #[test]
    fn test_expiry_date_and_rate_curve() {
        let cfg = load(&[
            ("SPOT", "214.12"),
            ("STRIKE", "215"),
            ("OPTION_KIND", " Put "),
            ("EXPIRY_DATE", "2024-07-19"),
            ("RATE_3M", "5.25"),
            ("RATE_6M", "5.10"),
            ("RATE_1Y", "4.90"),
            ("RATE_5Y", "4.30"),
            ("RATE_10Y", "4.25"),
            ("MARKET_PRICE", "4.1"),
            ("PRICE_SOURCE", "mid"),
            ("CHAIN_FILE", "chain.json"),
        ])
        .unwrap();
        assert_eq!(cfg.kind, OptionKind::Put);
        assert_eq!(cfg.days_to_expiry, 31);
        assert!((cfg.risk_free_rate() - 0.0525).abs() < 1e-12);
        assert_eq!(cfg.volatility, None);
        assert_eq!(cfg.market_price, Some(4.1));
        assert_eq!(cfg.price_source, PriceSource::MidPrice);
        assert_eq!(cfg.chain_file, Some(PathBuf::from("chain.json")));
    }

    #[test]
    fn test_bad_values() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("OPTION_KIND", "straddle"));
        let err = load(&pairs).unwrap_err();
        assert!(matches!(err, PricingError::Config(ref m) if m.starts_with("OPTION_KIND")));

        let mut pairs = MINIMAL.to_vec();
        pairs.push(("HEDGE_STEP", "tiny"));
        let err = load(&pairs).unwrap_err();
        assert!(matches!(err, PricingError::Config(ref m) if m.starts_with("HEDGE_STEP")));

        let mut pairs = MINIMAL.to_vec();
        pairs.retain(|(k, _)| *k != "DAYS_TO_EXPIRY");
        pairs.push(("EXPIRY_DATE", "19/07/2024"));
        assert!(load(&pairs).is_err());
    }

    #[test]
    fn test_empty_value_counts_as_unset() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("STRESS_VAL", ""));
        assert_eq!(load(&pairs).unwrap().stress_val, 0.0);
    }
}
