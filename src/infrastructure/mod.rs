// Infrastructure layer: file formats and process-level setup

#[cfg(feature = "cli")]
pub mod logging;
pub mod mps;

#[cfg(feature = "cli")]
pub use logging::init_logging;
