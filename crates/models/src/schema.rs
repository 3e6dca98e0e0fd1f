//! Per-category prediction schema.
//!
//! Published under `{BASE_URL}/schemas/{category}.json`. Describes the
//! model's feature column order, which columns are label-encoded
//! categoricals, the encoder class lists, and training metadata.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub const ENCODED_SUFFIX: &str = "_encoded";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CategorySchema {
    #[serde(default)]
    pub feature_columns: Vec<String>,
    #[serde(default)]
    pub categorical_columns: Vec<String>,
    /// categorical column -> ordered class list used at training time
    #[serde(default)]
    pub encoders: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub model_info: ModelInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelInfo {
    #[serde(default)]
    pub r2_score: Option<f64>,
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub trained_at: Option<String>,
}

impl CategorySchema {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let schema: CategorySchema =
            serde_json::from_slice(bytes).map_err(|e| ModelError::Decode(e.to_string()))?;
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.feature_columns.is_empty() {
            return Err(ModelError::Validation(
                "schema has no feature columns".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_categorical(&self, name: &str) -> bool {
        self.categorical_columns.iter().any(|c| c == name)
    }

    /// Encoded label for a categorical value; unknown classes map to 0,
    /// matching training-time label encoding of unseen values.
    pub fn encode(&self, column: &str, value: &str) -> f64 {
        self.encoders
            .get(column)
            .and_then(|classes| classes.iter().position(|c| c == value))
            .unwrap_or(0) as f64
    }

    /// Input keys a prediction payload may legally carry: categorical
    /// columns plus raw (non-encoded) feature columns plus the base names
    /// of encoded columns.
    pub fn accepted_inputs(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for col in &self.categorical_columns {
            keys.push(col.as_str());
        }
        for col in &self.feature_columns {
            match col.strip_suffix(ENCODED_SUFFIX) {
                Some(base) => {
                    if !keys.contains(&base) {
                        keys.push(base);
                    }
                }
                None => {
                    if !keys.contains(&col.as_str()) {
                        keys.push(col.as_str());
                    }
                }
            }
        }
        keys
    }

    /// Model confidence derived from the training r2 score, clamped to
    /// the [0.60, 0.95] band the product reports.
    pub fn confidence(&self) -> f64 {
        let r2 = self.model_info.r2_score.unwrap_or(0.8);
        r2.clamp(0.60, 0.95)
    }
}
