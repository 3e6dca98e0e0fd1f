pub mod assets;
pub mod errors;
pub mod explain;
pub mod features;
pub mod market;
pub mod predict;

pub use assets::{AssetLoader, CategoryAssets, ModelRegistry};
pub use errors::ServiceError;
pub use explain::{ExplanationInput, GeminiClient};
pub use predict::{Prediction, Predictor};
