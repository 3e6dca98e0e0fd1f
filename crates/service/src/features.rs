//! Feature vector preparation.
//!
//! Turns a request payload into the ordered numeric vector the model was
//! trained on: label-encoded categoricals via the schema's encoder class
//! lists, raw numerics as-is, missing numerics from a fixed default table.

use std::collections::HashMap;

use models::schema::{CategorySchema, ENCODED_SUFFIX};
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use crate::errors::ServiceError;

static DEFAULT_VALUES: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("rating", 4.0),
        ("discount", 10.0),
        ("discount_percentage", 10.0),
        ("stock", 50.0),
        ("warranty", 12.0),
        ("screen_size", 6.0),
        ("storage", 128.0),
        ("ram", 8.0),
        ("processor_score", 2000.0),
        ("dimensions", 100.0),
        ("weight", 20.0),
    ])
});

pub fn default_value(name: &str) -> f64 {
    DEFAULT_VALUES.get(name).copied().unwrap_or(0.0)
}

/// Reject payloads that do not conform to the schema: unknown keys,
/// non-string categoricals, non-numeric values for numeric columns.
pub fn validate_payload(
    payload: &Map<String, Value>,
    schema: &CategorySchema,
) -> Result<(), ServiceError> {
    let accepted = schema.accepted_inputs();
    for (key, value) in payload {
        if !accepted.contains(&key.as_str()) {
            return Err(ServiceError::Validation(format!(
                "unknown feature '{}'",
                key
            )));
        }
        if schema.is_categorical(key) {
            if !value.is_string() {
                return Err(ServiceError::Validation(format!(
                    "feature '{}' must be a string",
                    key
                )));
            }
        } else if as_number(value).is_none() {
            return Err(ServiceError::Validation(format!(
                "feature '{}' must be numeric",
                key
            )));
        }
    }
    Ok(())
}

/// Build the feature vector in schema column order. Assumes the payload
/// already passed `validate_payload`.
pub fn prepare_features(
    payload: &Map<String, Value>,
    schema: &CategorySchema,
) -> Result<Vec<f64>, ServiceError> {
    let mut features = Vec::with_capacity(schema.feature_columns.len());
    for column in &schema.feature_columns {
        match column.strip_suffix(ENCODED_SUFFIX) {
            Some(base) if schema.is_categorical(base) => {
                let value = payload
                    .get(base)
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                features.push(schema.encode(base, value));
            }
            // encoded column without a matching categorical: nothing to
            // look up, encode as the zero class
            Some(_) => features.push(0.0),
            None => {
                let value = payload
                    .get(column)
                    .and_then(as_number)
                    .unwrap_or_else(|| default_value(column));
                features.push(value);
            }
        }
    }
    Ok(features)
}

// Numbers, or strings that parse as numbers ("128" is fine, "lots" is not).
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> CategorySchema {
        serde_json::from_value(json!({
            "feature_columns": ["storage", "ram", "brand_encoded", "rating"],
            "categorical_columns": ["brand"],
            "encoders": {"brand": ["acme", "globex", "initech"]},
            "model_info": {"r2_score": 0.9}
        }))
        .unwrap()
    }

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn vector_follows_schema_order() {
        let payload = obj(json!({"storage": 256, "ram": "16", "brand": "initech", "rating": 4.5}));
        let feats = prepare_features(&payload, &schema()).unwrap();
        assert_eq!(feats, vec![256.0, 16.0, 2.0, 4.5]);
    }

    #[test]
    fn missing_numerics_use_defaults() {
        let payload = obj(json!({"brand": "acme"}));
        let feats = prepare_features(&payload, &schema()).unwrap();
        // storage 128, ram 8, acme -> 0, rating 4.0
        assert_eq!(feats, vec![128.0, 8.0, 0.0, 4.0]);
    }

    #[test]
    fn unknown_brand_encodes_to_zero() {
        let payload = obj(json!({"brand": "who-dis"}));
        let feats = prepare_features(&payload, &schema()).unwrap();
        assert_eq!(feats[2], 0.0);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let payload = obj(json!({"color": "red"}));
        let err = validate_payload(&payload, &schema()).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let payload = obj(json!({"storage": "lots"}));
        assert!(validate_payload(&payload, &schema()).is_err());
    }

    #[test]
    fn non_string_categorical_is_rejected() {
        let payload = obj(json!({"brand": 7}));
        assert!(validate_payload(&payload, &schema()).is_err());
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let payload = obj(json!({"storage": "512"}));
        validate_payload(&payload, &schema()).unwrap();
    }
}
