// Application layer: parameters and the solver façade

pub mod model;
pub mod params;

pub use model::{Model, Stage};
pub use params::{ParamValue, Params, Settings};
