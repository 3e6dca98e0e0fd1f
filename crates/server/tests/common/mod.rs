use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use httpmock::prelude::*;
use models::PriceModel;
use serde_json::json;
use server::routes::{self, AppState};
use service::{AssetLoader, GeminiClient, Predictor};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub struct TestApp {
    pub base_url: String,
}

/// Mount a complete single-category asset set (phones) on a mock server.
pub fn mount_phone_assets(assets: &MockServer) {
    let model = PriceModel {
        coefficients: vec![1.5, 20.0, 50.0, 30.0],
        intercept: 100.0,
    };
    assets.mock(|when, then| {
        when.method(GET).path("/models/index.json");
        then.status(200).json_body(json!({"categories": ["phones"]}));
    });
    assets.mock(|when, then| {
        when.method(GET).path("/models/phones.pkl");
        then.status(200).body(model.to_bytes().unwrap());
    });
    assets.mock(|when, then| {
        when.method(GET).path("/schemas/phones.json");
        then.status(200).json_body(json!({
            "feature_columns": ["storage", "ram", "brand_encoded", "rating"],
            "categorical_columns": ["brand"],
            "encoders": {"brand": ["acme", "globex"]},
            "model_info": {"r2_score": 0.88, "algorithm": "linear_regression"}
        }));
    });
    assets.mock(|when, then| {
        when.method(GET).path("/data/phones.csv");
        then.status(200).body(
            "brand,price,rating,storage,ram\n\
             acme,600.0,4.0,128,8\n\
             acme,620.0,4.1,128,8\n\
             globex,700.0,4.2,256,12\n\
             globex,710.0,4.4,256,12\n\
             acme,590.0,3.9,64,6\n",
        );
    });
}

/// Load assets from the mock server and serve the app on an ephemeral port.
pub async fn start_app(assets: &MockServer, ai: Option<GeminiClient>) -> TestApp {
    let loader = AssetLoader::new(reqwest::Client::new(), assets.url(""));
    let registry = loader.load_all(None).await.expect("load assets");
    let state = AppState {
        predictor: Predictor::new(Arc::new(registry)),
        explainer: ai.map(Arc::new),
    };
    let app: Router = routes::build_router(state, CorsLayer::very_permissive());

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind test listener");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    let base_url = format!("http://{}", addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("test server error: {}", e);
        }
    });
    TestApp { base_url }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}
