use option_calculator::chain::{analyze_chain, ChainQuote, LadderInputs, StrikeAnalytics};
use option_calculator::config::AppConfig;
use option_calculator::errors::{PricingError, PricingResult};
use option_calculator::hedge::{profit_profile, HedgePosition, ProfitProfile};
use option_calculator::integration::{
    exact_prices, integrate_delta, integrate_delta_stress, integrate_gamma, spot_window,
    SampledCurve,
};
use option_calculator::models::black_scholes::BlackScholes;
use option_calculator::models::greeks::Greeks;
use option_calculator::models::implied_vol::{implied_volatility_with, IvSolution, SolverConfig};
use option_calculator::models::ContractParams;
use serde::Serialize;

/// Everything one run produces, printed as a single JSON document.
#[derive(Debug, Serialize)]
struct Report {
    contract: ContractParams,
    implied_vol: Option<IvSolution>,
    greeks: Greeks,
    curves: Curves,
    #[serde(skip_serializing_if = "Option::is_none")]
    chain: Option<Vec<StrikeAnalytics>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hedge: Option<ProfitProfile>,
}

#[derive(Debug, Serialize)]
struct Curves {
    stress_val: f64,
    exact: SampledCurve,
    delta: SampledCurve,
    delta_stress: SampledCurve,
    gamma: SampledCurve,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("option calculator starting");

    let cfg = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    let report = match run(&cfg) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!("report serialization error: {e}");
            std::process::exit(1);
        }
    }
}

fn run(cfg: &AppConfig) -> PricingResult<Report> {
    let ttl_years = cfg.ttl_years();
    let rate = cfg.risk_free_rate();
    tracing::info!(
        spot = cfg.spot,
        strike = cfg.strike,
        kind = %cfg.kind,
        days = cfg.days_to_expiry,
        rate,
        "contract loaded"
    );

    // An IV solve is only fatal when no explicit volatility was configured.
    let solved = cfg.market_price.map(|mp| {
        implied_volatility_with(
            mp,
            cfg.spot,
            cfg.strike,
            ttl_years,
            rate,
            cfg.kind,
            &SolverConfig::default(),
        )
    });
    let implied_vol = match (solved, cfg.volatility) {
        (Some(Ok(sol)), _) => {
            tracing::info!(vol = sol.vol, iterations = sol.iterations, "implied volatility solved");
            Some(sol)
        }
        (Some(Err(e)), Some(_)) => {
            tracing::warn!(error = %e, "implied volatility unavailable, using configured volatility");
            None
        }
        (Some(Err(e)), None) => return Err(e),
        (None, _) => None,
    };

    let sigma = cfg
        .volatility
        .or(implied_vol.map(|s| s.vol))
        .ok_or_else(|| PricingError::Config("no volatility available".into()))?;
    let contract = ContractParams::new(cfg.spot, cfg.strike, ttl_years, rate, sigma, cfg.kind)?;

    let greeks = BlackScholes::greeks(&contract);
    tracing::info!(
        price = greeks.price,
        delta = greeks.delta,
        gamma = greeks.gamma,
        sigma,
        "contract priced"
    );

    let curves = build_curves(cfg, &contract)?;

    let chain = match &cfg.chain_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let quotes: Vec<ChainQuote> = serde_json::from_str(&raw)?;
            let inputs = LadderInputs {
                spot: cfg.spot,
                ttl_years,
                rate,
                kind: cfg.kind,
                source: cfg.price_source,
            };
            let analytics = analyze_chain(&inputs, &quotes, &SolverConfig::default())?;
            tracing::info!(
                file = %path.display(),
                strikes = analytics.len(),
                solved = analytics.iter().filter(|a| a.is_complete()).count(),
                "chain analyzed"
            );
            Some(analytics)
        }
        None => None,
    };

    // The hedge leg is priced at the market's implied vol.
    let hedge = match (cfg.market_price, implied_vol) {
        (Some(market_price), Some(sol)) => {
            let position = HedgePosition {
                contract: contract.with_sigma(sol.vol)?,
                market_price,
                shares: cfg.hedge_shares,
                contracts: cfg.hedge_contracts,
            };
            let profile = profit_profile(&position, cfg.hedge_half_width, cfg.hedge_step)?;
            tracing::info!(breakevens = ?profile.breakevens.as_slice(), "hedge profile built");
            Some(profile)
        }
        _ => None,
    };

    Ok(Report {
        contract,
        implied_vol,
        greeks,
        curves,
        chain,
        hedge,
    })
}

fn build_curves(cfg: &AppConfig, contract: &ContractParams) -> PricingResult<Curves> {
    let (start, end) = spot_window(cfg.spot, cfg.curve_half_width)?;
    if start > cfg.spot - cfg.curve_half_width {
        tracing::warn!(
            half_width = cfg.curve_half_width,
            start,
            "curve start raised above zero spot"
        );
    }

    let exact = exact_prices(start, end, contract)?;
    let delta = integrate_delta(start, end, contract)?;
    let delta_stress = integrate_delta_stress(start, end, contract, cfg.stress_val)?;
    let gamma = integrate_gamma(start, end, contract)?;

    let max_err = |curve: &SampledCurve| {
        curve
            .values()
            .zip(exact.values())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max)
    };
    tracing::info!(
        start,
        end,
        delta_max_err = max_err(&delta),
        gamma_max_err = max_err(&gamma),
        "curves integrated"
    );

    Ok(Curves {
        stress_val: cfg.stress_val,
        exact,
        delta,
        delta_stress,
        gamma,
    })
}
