// Domain module: problem model, transformation and service interfaces

pub mod error;
pub mod models;
pub mod relaxation_service;
pub mod transform;
pub mod value_objects;

pub use error::*;
pub use models::*;
pub use relaxation_service::*;
pub use transform::*;
pub use value_objects::*;
