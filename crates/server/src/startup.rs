use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use service::{AssetLoader, GeminiClient, Predictor};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, AppState};

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load config, fetch all remote assets, and build the shared state.
/// Every failure here is fatal: the service never starts half-loaded.
pub async fn build_state(cfg: &configs::AppConfig) -> Result<AppState, StartupError> {
    let asset_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.assets.request_timeout_secs))
        .build()
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;

    info!(base_url = %cfg.assets.base_url, "loading models & schemas from remote");
    let loader = AssetLoader::new(asset_client, cfg.assets.base_url.as_str());
    let registry = loader
        .load_all(cfg.assets.categories.as_deref())
        .await
        .map_err(|e| StartupError::AssetLoad(e.to_string()))?;
    info!(models = ?registry.names(), "models loaded");

    let explainer = match &cfg.ai.api_key {
        Some(key) => {
            let ai_client = reqwest::Client::builder()
                .timeout(Duration::from_secs(cfg.ai.request_timeout_secs))
                .build()
                .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
            info!(model = %cfg.ai.model, "google ai configured");
            Some(Arc::new(GeminiClient::new(
                ai_client,
                cfg.ai.endpoint.as_str(),
                cfg.ai.model.as_str(),
                key.as_str(),
            )))
        }
        None => {
            info!("no GOOGLE_AI_API_KEY set, explanations disabled");
            None
        }
    };

    Ok(AppState {
        predictor: Predictor::new(Arc::new(registry)),
        explainer,
    })
}

/// Public entry: resolve config, load assets, and run the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = configs::AppConfig::load_and_validate()?;
    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting price predictor server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
