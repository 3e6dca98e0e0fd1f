//! Market analytics: similarity-based average price and category stats.

use models::market::{MarketRecord, MarketTable};
use serde_json::{json, Map, Value};

use crate::errors::ServiceError;
use crate::features::as_number;

/// Fallback average when a category has no market data at all.
const NO_DATA_AVERAGE: f64 = 500.0;

/// Minimum comparable products before the filters are considered too narrow.
const MIN_COMPARABLE: usize = 5;

/// Average price of products comparable to the submitted features.
///
/// Filters the table down by brand and category-specific similarity
/// windows; when that leaves too few rows, restarts from the full table
/// narrowed by rating; an empty result falls back to the overall mean.
pub fn market_average(category: &str, payload: &Map<String, Value>, table: &MarketTable) -> f64 {
    if table.is_empty() {
        return NO_DATA_AVERAGE;
    }
    let all: Vec<&MarketRecord> = table.records().iter().collect();
    let mut pool = all.clone();

    if let Some(brand) = payload.get("brand").and_then(Value::as_str) {
        let matched: Vec<&MarketRecord> = pool
            .iter()
            .copied()
            .filter(|r| {
                r.brand
                    .as_deref()
                    .map_or(false, |b| b.eq_ignore_ascii_case(brand))
            })
            .collect();
        if !matched.is_empty() {
            pool = matched;
        }
    }

    match category {
        "phones" => {
            pool = within_window(pool, payload, "storage", 128.0);
            pool = within_window(pool, payload, "ram", 4.0);
        }
        "laptops" => {
            pool = within_window(pool, payload, "ram", 8.0);
            pool = within_window(pool, payload, "storage", 256.0);
        }
        "furniture" => {
            if let Some(material) = payload.get("material").and_then(Value::as_str) {
                let matched: Vec<&MarketRecord> = pool
                    .iter()
                    .copied()
                    .filter(|r| {
                        r.field("material")
                            .map_or(false, |m| m.eq_ignore_ascii_case(material))
                    })
                    .collect();
                if !matched.is_empty() {
                    pool = matched;
                }
            }
        }
        _ => {}
    }

    // Too narrow: widen back out, keeping only a rating band when we can.
    if pool.len() < MIN_COMPARABLE {
        pool = all;
        if let Some(rating) = payload.get("rating").and_then(as_number) {
            pool.retain(|r| r.rating.map_or(false, |have| (have - rating).abs() <= 1.0));
        }
    }

    if pool.is_empty() {
        return table.mean_price().unwrap_or(NO_DATA_AVERAGE);
    }
    pool.iter().map(|r| r.price).sum::<f64>() / pool.len() as f64
}

// Keep records whose `column` lies within `window` of the submitted value.
// Skipped entirely when the payload or the table lacks the column.
fn within_window<'a>(
    pool: Vec<&'a MarketRecord>,
    payload: &Map<String, Value>,
    column: &str,
    window: f64,
) -> Vec<&'a MarketRecord> {
    let Some(target) = payload.get(column).and_then(as_number) else {
        return pool;
    };
    if !pool.iter().any(|r| r.numeric(column).is_some()) {
        return pool;
    }
    pool.into_iter()
        .filter(|r| {
            r.numeric(column)
                .map_or(false, |have| (have - target).abs() <= window)
        })
        .collect()
}

/// Aggregate stats for a category's market table.
pub fn market_stats(category: &str, table: &MarketTable) -> Result<Value, ServiceError> {
    let price = table
        .price_stats()
        .ok_or_else(|| ServiceError::not_found(&format!("market data for '{}'", category)))?;
    let rating = table.rating_stats();
    let top_brands: Map<String, Value> = table
        .top_brands(5)
        .into_iter()
        .map(|(brand, count)| (brand, json!(count)))
        .collect();

    Ok(json!({
        "category": category,
        "total_products": table.len(),
        "price_stats": {
            "min": price.min,
            "max": price.max,
            "mean": price.mean,
            "median": price.median,
            "std": price.std,
        },
        "rating_stats": {
            "min": rating.map(|r| r.min),
            "max": rating.map(|r| r.max),
            "mean": rating.map(|r| r.mean),
        },
        "top_brands": top_brands,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> MarketTable {
        let csv = "\
brand,price,rating,storage,ram
acme,500.0,4.5,128,8
acme,520.0,4.4,128,8
acme,510.0,4.6,256,8
acme,490.0,4.5,128,12
acme,505.0,4.3,128,8
globex,900.0,4.0,256,12
initech,1200.0,4.8,512,16
";
        MarketTable::from_csv(csv.as_bytes()).unwrap()
    }

    fn payload(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn brand_filter_narrows_average() {
        let p = payload(json!({"brand": "ACME", "storage": 128, "ram": 8}));
        let avg = market_average("phones", &p, &table());
        // acme rows within storage ±128 and ram ±4: all five acme rows
        assert!((avg - 505.0).abs() < 1e-9);
    }

    #[test]
    fn too_few_matches_broaden_by_rating() {
        let p = payload(json!({"brand": "initech", "rating": 4.8}));
        let avg = market_average("phones", &p, &table());
        // single initech row is < MIN_COMPARABLE, broadened to rating ±1.0
        let expected = (500.0 + 520.0 + 510.0 + 490.0 + 505.0 + 900.0 + 1200.0) / 7.0;
        assert!((avg - expected).abs() < 1e-9);
    }

    #[test]
    fn empty_table_yields_fallback() {
        let empty = MarketTable::from_csv(b"price\n".as_ref()).unwrap();
        let avg = market_average("phones", &payload(json!({})), &empty);
        assert_eq!(avg, 500.0);
    }

    #[test]
    fn unknown_category_skips_similarity_windows() {
        let p = payload(json!({"storage": 10_000}));
        // no window filters for unknown categories; pool stays full
        let avg = market_average("appliances", &p, &table());
        let expected = (500.0 + 520.0 + 510.0 + 490.0 + 505.0 + 900.0 + 1200.0) / 7.0;
        assert!((avg - expected).abs() < 1e-9);
    }

    #[test]
    fn stats_payload_shape() {
        let stats = market_stats("phones", &table()).unwrap();
        assert_eq!(stats["total_products"], 7);
        assert_eq!(stats["price_stats"]["min"], 490.0);
        assert_eq!(stats["top_brands"]["acme"], 5);
        assert!(stats["rating_stats"]["mean"].is_number());
    }

    #[test]
    fn stats_on_empty_table_is_not_found() {
        let empty = MarketTable::from_csv(b"price\n".as_ref()).unwrap();
        assert!(matches!(
            market_stats("phones", &empty),
            Err(ServiceError::NotFound(_))
        ));
    }
}
