pub mod chain;
pub mod config;
pub mod errors;
pub mod hedge;
pub mod integration;
pub mod models;
pub mod rates;

pub use errors::{PricingError, PricingResult};
pub use integration::{integrate_delta, integrate_delta_stress, integrate_gamma};
pub use models::black_scholes::price;
pub use models::greeks::{delta, gamma, Greeks};
pub use models::implied_vol::{implied_volatility, implied_volatility_with, IvSolution, SolverConfig};
pub use models::{ContractParams, OptionKind};
