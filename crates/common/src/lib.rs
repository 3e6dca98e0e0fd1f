use thiserror::Error;

pub mod remote;
pub mod types;
pub mod utils;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("upstream returned status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health {
            status: "ok",
            models_loaded: vec!["phones".into()],
            ai_enabled: false,
        };
        assert_eq!(h.status, "ok");
        assert!(!h.ai_enabled);
    }
}
