use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use common::types::Health;
use service::{ExplanationInput, GeminiClient, Predictor};

use crate::errors::ApiError;
use crate::observability;
use crate::openapi::ApiDoc;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub predictor: Predictor,
    pub explainer: Option<Arc<GeminiClient>>,
}

#[derive(Debug, Deserialize)]
pub struct PredictParams {
    /// Opt-in enrichment; only honored when an AI key is configured.
    #[serde(default)]
    pub explain: bool,
}

#[utoipa::path(get, path = "/health", tag = "health",
    responses((status = 200, description = "Service health", body = crate::openapi::HealthResponse)))]
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        models_loaded: state.predictor.registry().names(),
        ai_enabled: state.explainer.is_some(),
    })
}

#[utoipa::path(get, path = "/categories", tag = "categories",
    responses((status = 200, description = "Loaded categories with their schema summary")))]
pub async fn categories(State(state): State<AppState>) -> Json<Value> {
    let mut info = Map::new();
    for (name, assets) in state.predictor.registry().iter() {
        info.insert(
            name.clone(),
            json!({
                "name": title_case(name),
                "features": &assets.schema.feature_columns,
                "categorical": &assets.schema.categorical_columns,
                "model_info": &assets.schema.model_info,
            }),
        );
    }
    Json(json!({ "categories": info }))
}

#[utoipa::path(get, path = "/schema/{category}", tag = "categories",
    params(("category" = String, Path, description = "Product category")),
    responses((status = 200, description = "Raw prediction schema"), (status = 404, description = "Unknown category")))]
pub async fn get_schema(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let assets = state
        .predictor
        .registry()
        .get(&category)
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;
    let schema = serde_json::to_value(&assets.schema)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(schema))
}

#[utoipa::path(post, path = "/predict/{category}", tag = "predict",
    params(
        ("category" = String, Path, description = "Product category"),
        ("explain" = Option<bool>, Query, description = "Attach an AI explanation when available"),
    ),
    responses(
        (status = 200, description = "Prediction", body = crate::openapi::PredictionResponse),
        (status = 400, description = "Payload violates the category schema"),
        (status = 404, description = "Unknown category"),
    ))]
pub async fn predict(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<PredictParams>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let timer = observability::PREDICTION_DURATION.start_timer();
    observability::PREDICTIONS_TOTAL.inc();

    let mut prediction = match state.predictor.predict(&category, &payload) {
        Ok(p) => p,
        Err(e) => {
            observability::PREDICTION_ERRORS_TOTAL.inc();
            return Err(e.into());
        }
    };

    // With no key configured there is no client and no outbound call; with
    // one, a failed call degrades to a prediction without explanation.
    if params.explain {
        if let Some(ai) = &state.explainer {
            observability::EXPLANATIONS_TOTAL.inc();
            let input = ExplanationInput {
                category: prediction.category.clone(),
                predicted_price: prediction.predicted_price,
                market_average: prediction.market_average,
                features: prediction.features_used.clone(),
                confidence: prediction.confidence,
            };
            match ai.explain(&input).await {
                Ok(text) => prediction.explanation = Some(text),
                Err(e) => {
                    observability::EXPLANATION_FAILURES_TOTAL.inc();
                    warn!(%category, error = %e, "explanation degraded, serving prediction without it");
                }
            }
        }
    }

    timer.observe_duration();
    let body = serde_json::to_value(&prediction).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(body))
}

#[utoipa::path(post, path = "/explain", tag = "predict",
    request_body = crate::openapi::ExplainRequest,
    responses(
        (status = 200, description = "Natural-language explanation"),
        (status = 502, description = "Generative API failed"),
        (status = 503, description = "AI explanation service not configured"),
    ))]
pub async fn explain(
    State(state): State<AppState>,
    Json(input): Json<ExplanationInput>,
) -> Result<Json<Value>, ApiError> {
    let ai = state.explainer.as_ref().ok_or_else(|| {
        ApiError::Unavailable("AI explanation service not available".to_string())
    })?;
    observability::EXPLANATIONS_TOTAL.inc();
    let text = ai.explain(&input).await.map_err(|e| {
        observability::EXPLANATION_FAILURES_TOTAL.inc();
        ApiError::from(e)
    })?;
    Ok(Json(json!({
        "explanation": text,
        "category": input.category,
        "confidence": input.confidence,
    })))
}

#[utoipa::path(get, path = "/market-stats/{category}", tag = "market",
    params(("category" = String, Path, description = "Product category")),
    responses((status = 200, description = "Market statistics"), (status = 404, description = "Unknown category or no data")))]
pub async fn market_stats(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let assets = state
        .predictor
        .registry()
        .get(&category)
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;
    let stats = service::market::market_stats(&category, &assets.market)?;
    Ok(Json(stats))
}

pub async fn metrics() -> (axum::http::StatusCode, String) {
    observability::encode_metrics()
}

pub async fn openapi_json() -> Json<Value> {
    Json(serde_json::to_value(ApiDoc::openapi()).unwrap_or_else(|_| json!({})))
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Build the full application router.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/categories", get(categories))
        .route("/schema/:category", get(get_schema))
        .route("/predict/:category", post(predict))
        .route("/explain", post(explain))
        .route("/market-stats/:category", get(market_stats))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
