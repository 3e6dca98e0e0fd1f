use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("asset fetch failed: {0}")]
    Fetch(#[from] common::CoreError),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
    #[error("upstream error: {0}")]
    Upstream(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{} not found", entity))
    }
}
