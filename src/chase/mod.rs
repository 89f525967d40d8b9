pub mod features;
pub mod models;
pub mod predictor;
pub mod presenter;
pub mod validation;

pub use models::MatchState;
pub use predictor::{PredictError, Predictor};
pub use presenter::render;
