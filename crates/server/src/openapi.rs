use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub models_loaded: Vec<String>,
    pub ai_enabled: bool,
}

#[derive(ToSchema)]
pub struct PredictionResponse {
    pub category: String,
    pub predicted_price: f64,
    pub market_average: f64,
    pub confidence: f64,
    pub explanation: Option<String>,
}

#[derive(ToSchema)]
pub struct ExplainRequest {
    pub category: String,
    pub predicted_price: f64,
    pub market_average: f64,
    pub confidence: f64,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::categories,
        crate::routes::get_schema,
        crate::routes::predict,
        crate::routes::explain,
        crate::routes::market_stats,
    ),
    components(
        schemas(
            HealthResponse,
            PredictionResponse,
            ExplainRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "categories"),
        (name = "predict"),
        (name = "market"),
    )
)]
pub struct ApiDoc;
