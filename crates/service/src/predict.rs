//! Prediction assembly: model inference plus market comparison.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::assets::ModelRegistry;
use crate::errors::ServiceError;
use crate::features::{prepare_features, validate_payload};
use crate::market::market_average;

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub vs_market: &'static str,
    pub difference: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub category: String,
    pub predicted_price: f64,
    pub market_average: f64,
    pub confidence: f64,
    pub comparison: Comparison,
    pub features_used: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Clone)]
pub struct Predictor {
    registry: Arc<ModelRegistry>,
}

impl Predictor {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn predict(&self, category: &str, payload: &Value) -> Result<Prediction, ServiceError> {
        let assets = self
            .registry
            .get(category)
            .ok_or_else(|| ServiceError::not_found(&format!("category '{}'", category)))?;
        let object = payload
            .as_object()
            .ok_or_else(|| ServiceError::Validation("payload must be a JSON object".into()))?;

        validate_payload(object, &assets.schema)?;
        let features = prepare_features(object, &assets.schema)?;
        let predicted = assets.model.predict(&features)?;
        let average = market_average(category, object, &assets.market);

        let difference = (predicted - average).abs();
        let percentage = difference / average.max(1e-6) * 100.0;
        Ok(Prediction {
            category: category.to_string(),
            predicted_price: round2(predicted),
            market_average: round2(average),
            confidence: round2(assets.schema.confidence()),
            comparison: Comparison {
                vs_market: if predicted > average { "above" } else { "below" },
                difference: round2(difference),
                percentage: round1(percentage),
            },
            features_used: payload.clone(),
            explanation: None,
        })
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{CategorySchema, MarketTable, PriceModel};
    use serde_json::json;

    fn registry() -> Arc<ModelRegistry> {
        let schema: CategorySchema = serde_json::from_value(json!({
            "feature_columns": ["storage", "ram", "brand_encoded", "rating"],
            "categorical_columns": ["brand"],
            "encoders": {"brand": ["acme", "globex"]},
            "model_info": {"r2_score": 0.88}
        }))
        .unwrap();
        let model = PriceModel {
            coefficients: vec![1.5, 20.0, 50.0, 30.0],
            intercept: 100.0,
        };
        let market = MarketTable::from_csv(
            b"brand,price,rating,storage,ram\nacme,600.0,4.0,128,8\nglobex,700.0,4.2,128,8\n"
                .as_ref(),
        )
        .unwrap();
        let mut registry = ModelRegistry::default();
        registry.insert(
            "phones",
            crate::assets::CategoryAssets {
                model,
                schema,
                market,
            },
        );
        Arc::new(registry)
    }

    #[test]
    fn prediction_includes_comparison_and_rounding() {
        let predictor = Predictor::new(registry());
        let out = predictor
            .predict(
                "phones",
                &json!({"storage": 128, "ram": 8, "brand": "globex", "rating": 4.0}),
            )
            .unwrap();
        // 1.5*128 + 20*8 + 50*1 + 30*4 + 100 = 642
        assert_eq!(out.predicted_price, 642.0);
        assert_eq!(out.confidence, 0.88);
        assert!(out.market_average > 0.0);
        assert!(out.explanation.is_none());
        assert!(matches!(out.comparison.vs_market, "above" | "below"));
    }

    #[test]
    fn unknown_category_is_not_found() {
        let predictor = Predictor::new(registry());
        let err = predictor.predict("boats", &json!({})).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let predictor = Predictor::new(registry());
        let err = predictor.predict("phones", &json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
