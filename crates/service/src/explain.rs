//! Natural-language explanation client (Gemini-style generateContent API).
//!
//! Only constructed when an API key is configured; callers that hold no
//! client simply never attempt an outbound call.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::ServiceError;

/// Everything the prompt needs about a finished prediction.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplanationInput {
    pub category: String,
    pub predicted_price: f64,
    pub market_average: f64,
    #[serde(default)]
    pub features: Value,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.8
}

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self {
            client,
            endpoint,
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    fn request_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        )
    }

    pub fn build_prompt(input: &ExplanationInput) -> String {
        let features = serde_json::to_string_pretty(&input.features)
            .unwrap_or_else(|_| "{}".to_string());
        format!(
            "You are a friendly AI explaining a price prediction for a {category}.\n\
             - Predicted Price: ${predicted:.2}\n\
             - Market Average: ${average:.2}\n\
             - Model Confidence: {confidence:.0}%\n\
             - Product Features: {features}\n\n\
             Write 2 short paragraphs:\n\
             1) How this compares to the market and why\n\
             2) Which features likely influenced price + a simple buying tip\n\
             Keep it concise, helpful, non-technical.",
            category = input.category,
            predicted = input.predicted_price,
            average = input.market_average,
            confidence = input.confidence * 100.0,
            features = features,
        )
    }

    /// Ask the generative API for an explanation of a prediction.
    pub async fn explain(&self, input: &ExplanationInput) -> Result<String, ServiceError> {
        let prompt = Self::build_prompt(input);
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });

        let resp = self
            .client
            .post(self.request_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ServiceError::Upstream(format!(
                "generative API returned status {}",
                status.as_u16()
            )));
        }
        let payload: Value = resp
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;
        debug!(category = %input.category, "explanation received");

        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ServiceError::Upstream("generative API response had no text candidate".to_string())
            })
    }
}
