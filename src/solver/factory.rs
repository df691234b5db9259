use crate::domain::{Error, RelaxationBackend, RelaxationSolver, Result};

/// Factory for creating LP relaxation backends from the `lp/solver` parameter
pub struct RelaxationFactory;

impl RelaxationFactory {
    /// Create the backend, failing if it was not compiled in
    pub fn create(backend: RelaxationBackend) -> Result<Box<dyn RelaxationSolver>> {
        match backend {
            #[cfg(feature = "highs")]
            RelaxationBackend::Highs => Ok(Box::new(super::HighsRelaxation::new())),
            #[cfg(feature = "cbc")]
            RelaxationBackend::CoinCbc => Ok(Box::new(super::CoinCbcRelaxation::new())),
            #[allow(unreachable_patterns)]
            other => Err(Error::Relaxation(format!(
                "{other} support is not compiled in"
            ))),
        }
    }

    /// Backends available in this build
    pub fn available() -> Vec<RelaxationBackend> {
        let mut backends = Vec::new();
        if cfg!(feature = "highs") {
            backends.push(RelaxationBackend::Highs);
        }
        if cfg!(feature = "cbc") {
            backends.push(RelaxationBackend::CoinCbc);
        }
        backends
    }
}
