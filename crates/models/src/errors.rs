use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("artifact decode error: {0}")]
    Decode(String),
    #[error("validation error: {0}")]
    Validation(String),
}
