//! Remote asset loading.
//!
//! Everything the service predicts with is fetched once at startup from
//! `BASE_URL` by fixed suffix convention:
//!
//! - `{base}/models/index.json`      category manifest
//! - `{base}/models/{category}.pkl`  bincode model artifact
//! - `{base}/schemas/{category}.json` prediction schema
//! - `{base}/data/{category}.csv`    market data table
//!
//! Manifest discovery is allowed to fail (falls back to the default
//! category list); after that, any fetch or decode failure is fatal so the
//! process refuses to start half-loaded.

use std::collections::BTreeMap;

use common::remote;
use common::types::AssetManifest;
use models::{CategorySchema, MarketTable, PriceModel};
use tracing::{info, warn};

use crate::errors::ServiceError;

/// Fallback when the manifest is unreachable or empty.
pub const DEFAULT_CATEGORIES: &[&str] = &["phones", "laptops", "furniture"];

#[derive(Debug)]
pub struct CategoryAssets {
    pub model: PriceModel,
    pub schema: CategorySchema,
    pub market: MarketTable,
}

/// Immutable in-memory registry of everything loaded at startup. Shared
/// across request handlers behind an `Arc` for the process lifetime.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    categories: BTreeMap<String, CategoryAssets>,
}

impl ModelRegistry {
    pub fn insert(&mut self, category: impl Into<String>, assets: CategoryAssets) {
        self.categories.insert(category.into(), assets);
    }

    pub fn get(&self, category: &str) -> Option<&CategoryAssets> {
        self.categories.get(category)
    }

    pub fn names(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CategoryAssets)> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

pub struct AssetLoader {
    client: reqwest::Client,
    base_url: String,
}

impl AssetLoader {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    pub fn manifest_url(&self) -> String {
        format!("{}/models/index.json", self.base_url)
    }

    pub fn model_url(&self, category: &str) -> String {
        format!("{}/models/{}.pkl", self.base_url, category)
    }

    pub fn schema_url(&self, category: &str) -> String {
        format!("{}/schemas/{}.json", self.base_url, category)
    }

    pub fn data_url(&self, category: &str) -> String {
        format!("{}/data/{}.csv", self.base_url, category)
    }

    /// Category list from the remote manifest, falling back to
    /// `DEFAULT_CATEGORIES` when it cannot be fetched or is empty.
    pub async fn discover_categories(&self) -> Vec<String> {
        let url = self.manifest_url();
        match remote::get_json::<AssetManifest>(&self.client, &url).await {
            Ok(manifest) if !manifest.categories.is_empty() => {
                info!(count = manifest.categories.len(), "category manifest loaded");
                manifest.categories
            }
            Ok(_) => {
                warn!(%url, "category manifest is empty, using defaults");
                DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
            }
            Err(e) => {
                warn!(%url, error = %e, "category manifest unavailable, using defaults");
                DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
            }
        }
    }

    /// Fetch and decode the three assets for one category.
    pub async fn load_category(&self, category: &str) -> Result<CategoryAssets, ServiceError> {
        let model_bytes = remote::get_bytes(&self.client, &self.model_url(category)).await?;
        let model = PriceModel::from_bytes(&model_bytes)?;
        info!(category, width = model.feature_count(), "model loaded");

        let schema_bytes = remote::get_bytes(&self.client, &self.schema_url(category)).await?;
        let schema = CategorySchema::from_slice(&schema_bytes)?;
        info!(category, features = schema.feature_columns.len(), "schema loaded");

        let data_text = remote::get_text(&self.client, &self.data_url(category)).await?;
        let market = MarketTable::from_csv(data_text.as_bytes())?;
        info!(category, rows = market.len(), "market data loaded");

        if schema.feature_columns.len() != model.feature_count() {
            return Err(ServiceError::Validation(format!(
                "category '{}': schema has {} feature columns but model expects {}",
                category,
                schema.feature_columns.len(),
                model.feature_count()
            )));
        }

        Ok(CategoryAssets {
            model,
            schema,
            market,
        })
    }

    /// Load every category into a registry. `configured` bypasses manifest
    /// discovery when the deployment pins its category list.
    pub async fn load_all(
        &self,
        configured: Option<&[String]>,
    ) -> Result<ModelRegistry, ServiceError> {
        let categories = match configured {
            Some(list) if !list.is_empty() => list.to_vec(),
            _ => self.discover_categories().await,
        };

        let mut registry = ModelRegistry::default();
        for category in &categories {
            let assets = self.load_category(category).await?;
            registry.insert(category.clone(), assets);
        }
        if registry.is_empty() {
            return Err(ServiceError::Validation(
                "no categories available to load".to_string(),
            ));
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn loader(base: &str) -> AssetLoader {
        AssetLoader::new(reqwest::Client::new(), base)
    }

    #[test]
    fn urls_follow_suffix_convention() {
        let l = loader("https://x/y/");
        assert_eq!(l.model_url("phones"), "https://x/y/models/phones.pkl");
        assert_eq!(l.schema_url("phones"), "https://x/y/schemas/phones.json");
        assert_eq!(l.data_url("phones"), "https://x/y/data/phones.csv");
        assert_eq!(l.manifest_url(), "https://x/y/models/index.json");
    }

    #[tokio::test]
    async fn manifest_failure_falls_back_to_defaults() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/models/index.json");
            then.status(500);
        });
        let cats = loader(&server.url("")).discover_categories().await;
        assert_eq!(cats, vec!["phones", "laptops", "furniture"]);
    }

    #[tokio::test]
    async fn category_asset_failure_is_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/models/index.json");
            then.status(200)
                .json_body(serde_json::json!({"categories": ["phones"]}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/models/phones.pkl");
            then.status(404);
        });
        let err = loader(&server.url("")).load_all(None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Fetch(_)));
    }

    #[tokio::test]
    async fn loads_a_full_category() {
        let model = PriceModel {
            coefficients: vec![1.0, 2.0],
            intercept: 10.0,
        };
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/models/laptops.pkl");
            then.status(200).body(model.to_bytes().unwrap());
        });
        server.mock(|when, then| {
            when.method(GET).path("/schemas/laptops.json");
            then.status(200).json_body(serde_json::json!({
                "feature_columns": ["ram", "storage"],
                "categorical_columns": [],
                "encoders": {},
                "model_info": {"r2_score": 0.9}
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/data/laptops.csv");
            then.status(200).body("price,ram\n999.0,16\n");
        });

        let configured = vec!["laptops".to_string()];
        let registry = loader(&server.url(""))
            .load_all(Some(&configured))
            .await
            .unwrap();
        assert_eq!(registry.names(), vec!["laptops"]);
        let assets = registry.get("laptops").unwrap();
        assert_eq!(assets.model.feature_count(), 2);
        assert_eq!(assets.market.len(), 1);
    }
}
