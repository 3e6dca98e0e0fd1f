//! Checked HTTP GET helpers for remote asset fetching.
//!
//! All loaders go through these so that non-2xx responses and decode
//! failures map onto `CoreError` uniformly.

use crate::CoreError;

async fn get_checked(client: &reqwest::Client, url: &str) -> Result<reqwest::Response, CoreError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| CoreError::Network(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(CoreError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(resp)
}

/// Fetch a URL and return the raw body bytes.
pub async fn get_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, CoreError> {
    let resp = get_checked(client, url).await?;
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| CoreError::Network(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Fetch a URL and return the body as UTF-8 text.
pub async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, CoreError> {
    let resp = get_checked(client, url).await?;
    resp.text()
        .await
        .map_err(|e| CoreError::Parse(e.to_string()))
}

/// Fetch a URL and deserialize the body as JSON.
pub async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, CoreError> {
    let resp = get_checked(client, url).await?;
    resp.json::<T>()
        .await
        .map_err(|e| CoreError::Parse(e.to_string()))
}
