// LP relaxation adapters: concrete implementations of RelaxationSolver

#[cfg(feature = "cbc")]
pub mod cbc_relaxation;
pub mod factory;
#[cfg(feature = "highs")]
pub mod highs_relaxation;

#[cfg(feature = "cbc")]
pub use cbc_relaxation::CoinCbcRelaxation;
pub use factory::RelaxationFactory;
#[cfg(feature = "highs")]
pub use highs_relaxation::HighsRelaxation;
