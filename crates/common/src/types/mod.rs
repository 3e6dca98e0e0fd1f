use serde::{Deserialize, Serialize};

/// Service health report returned by `GET /health`.
#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    pub models_loaded: Vec<String>,
    pub ai_enabled: bool,
}

/// Manifest published next to the model artifacts, listing the categories
/// the service should load.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AssetManifest {
    pub categories: Vec<String>,
}
