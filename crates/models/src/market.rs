//! Market data tables.
//!
//! Published under `{BASE_URL}/data/{category}.csv`. Columns vary per
//! category; `price` is required, `brand` and `rating` are recognized when
//! present, and everything else stays available for numeric lookups.

use std::collections::HashMap;

use crate::errors::ModelError;

#[derive(Debug, Clone)]
pub struct MarketRecord {
    pub price: f64,
    pub brand: Option<String>,
    pub rating: Option<f64>,
    fields: HashMap<String, String>,
}

impl MarketRecord {
    /// Parse an arbitrary column as a number, if present and numeric.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        self.fields.get(column).and_then(|v| v.trim().parse().ok())
    }

    pub fn field(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarketTable {
    records: Vec<MarketRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl MarketTable {
    pub fn from_csv(bytes: &[u8]) -> Result<Self, ModelError> {
        let mut reader = csv::Reader::from_reader(bytes);
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ModelError::Decode(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if !headers.iter().any(|h| h == "price") {
            return Err(ModelError::Validation(
                "market data is missing a price column".to_string(),
            ));
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| ModelError::Decode(e.to_string()))?;
            let mut fields = HashMap::with_capacity(headers.len());
            for (header, value) in headers.iter().zip(row.iter()) {
                fields.insert(header.clone(), value.trim().to_string());
            }
            let price = fields
                .get("price")
                .and_then(|v| v.parse::<f64>().ok())
                .ok_or_else(|| {
                    ModelError::Validation(format!(
                        "unparseable price in market data row {}",
                        records.len() + 1
                    ))
                })?;
            let brand = fields.get("brand").filter(|v| !v.is_empty()).cloned();
            let rating = fields.get("rating").and_then(|v| v.parse().ok());
            records.push(MarketRecord {
                price,
                brand,
                rating,
                fields,
            });
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[MarketRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn mean_price(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        Some(self.records.iter().map(|r| r.price).sum::<f64>() / self.records.len() as f64)
    }

    pub fn price_stats(&self) -> Option<PriceStats> {
        let prices: Vec<f64> = self.records.iter().map(|r| r.price).collect();
        summarize(&prices).map(|(min, max, mean)| PriceStats {
            min,
            max,
            mean,
            median: median(&prices),
            std: sample_std(&prices, mean),
        })
    }

    pub fn rating_stats(&self) -> Option<RatingStats> {
        let ratings: Vec<f64> = self.records.iter().filter_map(|r| r.rating).collect();
        summarize(&ratings).map(|(min, max, mean)| RatingStats { min, max, mean })
    }

    /// Brands by descending frequency, at most `limit` entries.
    pub fn top_brands(&self, limit: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            if let Some(brand) = &record.brand {
                *counts.entry(brand.as_str()).or_insert(0) += 1;
            }
        }
        let mut ranked: Vec<(String, usize)> =
            counts.into_iter().map(|(b, n)| (b.to_string(), n)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }
}

fn summarize(values: &[f64]) -> Option<(f64, f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }
    Some((min, max, sum / values.len() as f64))
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

// Sample standard deviation (ddof = 1); 0.0 for fewer than two values.
fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
brand,price,rating,storage,ram
acme,499.0,4.5,128,8
globex,899.0,4.0,256,12
acme,450.0,3.5,64,6
initech,1200.0,4.8,512,16
";

    #[test]
    fn parses_rows_and_typed_columns() {
        let table = MarketTable::from_csv(CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 4);
        let first = &table.records()[0];
        assert_eq!(first.price, 499.0);
        assert_eq!(first.brand.as_deref(), Some("acme"));
        assert_eq!(first.rating, Some(4.5));
        assert_eq!(first.numeric("storage"), Some(128.0));
        assert_eq!(first.numeric("nonexistent"), None);
    }

    #[test]
    fn price_column_is_required() {
        let err = MarketTable::from_csv(b"brand,rating\nacme,4.0\n").unwrap_err();
        assert!(matches!(err, ModelError::Validation(_)));
    }

    #[test]
    fn stats_match_hand_computation() {
        let table = MarketTable::from_csv(CSV.as_bytes()).unwrap();
        let stats = table.price_stats().unwrap();
        assert_eq!(stats.min, 450.0);
        assert_eq!(stats.max, 1200.0);
        assert!((stats.mean - 762.0).abs() < 1e-9);
        assert!((stats.median - 699.0).abs() < 1e-9);
        // sample variance of [499, 899, 450, 1200]
        assert!((stats.std - 354.554).abs() < 1e-2);
    }

    #[test]
    fn top_brands_rank_by_count() {
        let table = MarketTable::from_csv(CSV.as_bytes()).unwrap();
        let brands = table.top_brands(2);
        assert_eq!(brands[0], ("acme".to_string(), 2));
        assert_eq!(brands.len(), 2);
    }
}
