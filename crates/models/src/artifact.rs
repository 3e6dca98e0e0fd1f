//! Pre-trained price model artifact.
//!
//! Artifacts are published under `{BASE_URL}/models/{category}.pkl` as a
//! bincode-encoded `PriceModel`. The model itself is a plain linear
//! regressor: a coefficient per schema feature column plus an intercept.

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl PriceModel {
    /// Decode an artifact from its serialized bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        let model: PriceModel =
            bincode::deserialize(bytes).map_err(|e| ModelError::Decode(e.to_string()))?;
        if model.coefficients.is_empty() {
            return Err(ModelError::Validation(
                "model has no coefficients".to_string(),
            ));
        }
        Ok(model)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        bincode::serialize(self).map_err(|e| ModelError::Decode(e.to_string()))
    }

    /// Number of features the model expects, in schema column order.
    pub fn feature_count(&self) -> usize {
        self.coefficients.len()
    }

    /// Run inference over an ordered feature vector.
    pub fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::Validation(format!(
                "feature vector length {} does not match model width {}",
                features.len(),
                self.coefficients.len()
            )));
        }
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(c, x)| c * x)
            .sum();
        Ok(dot + self.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicts_linear_combination() {
        let model = PriceModel {
            coefficients: vec![2.0, 0.5],
            intercept: 100.0,
        };
        let y = model.predict(&[10.0, 4.0]).unwrap();
        assert!((y - 122.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_wrong_feature_width() {
        let model = PriceModel {
            coefficients: vec![1.0, 1.0, 1.0],
            intercept: 0.0,
        };
        assert!(model.predict(&[1.0]).is_err());
    }

    #[test]
    fn decodes_its_own_encoding() {
        let model = PriceModel {
            coefficients: vec![3.5, -1.25],
            intercept: 42.0,
        };
        let bytes = model.to_bytes().unwrap();
        let back = PriceModel::from_bytes(&bytes).unwrap();
        assert_eq!(back.coefficients, model.coefficients);
        assert_eq!(back.intercept, model.intercept);
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let err = PriceModel::from_bytes(&[0xff; 3]).unwrap_err();
        assert!(matches!(err, ModelError::Decode(_)));
    }
}
