use anyhow::{anyhow, Context};
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            worker_threads: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Root location the model/schema/data files are fetched from.
    /// Required; overridden by `BASE_URL`.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Optional fixed category list; skips manifest discovery when set.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout_secs: default_request_timeout(),
            categories: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Overridden by `GOOGLE_AI_API_KEY`; absence disables explanations.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ai_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_ai_model(),
            endpoint: default_ai_endpoint(),
            request_timeout_secs: default_ai_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}
fn default_ai_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_ai_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_ai_timeout() -> u64 {
    20
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{path}'"))?;
    let cfg: AppConfig =
        toml::from_str(&content).with_context(|| format!("failed to parse config file '{path}'"))?;
    Ok(cfg)
}

/// Read the config file at `path` when it exists; an absent file yields the
/// defaults, while an unreadable or malformed file is an error.
pub fn load_optional(path: &str) -> Result<AppConfig> {
    if std::path::Path::new(path).exists() {
        load_from_file(path)
    } else {
        Ok(AppConfig::default())
    }
}

impl AppConfig {
    /// Load `CONFIG_PATH` (default `config.toml`) when present, then apply
    /// env overrides and validate. A broken config file aborts startup; only
    /// a genuinely absent one falls back to defaults.
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = load_optional(&path)?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize_from_env();
        self.assets.normalize_from_env();
        self.assets.validate()?;
        self.ai.normalize_from_env();
        Ok(())
    }
}

impl ServerConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            if !host.trim().is_empty() {
                self.host = host;
            }
        }
        // PORT is the platform-provided binding, e.g. on Heroku-style hosts.
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            self.worker_threads = Some(w);
        }
    }
}

impl AssetsConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(url) = std::env::var("BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(anyhow!(
                "BASE_URL is required: set the env var or assets.base_url in config.toml"
            ));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(anyhow!(
                "BASE_URL must be an http(s) URL, got '{}'",
                self.base_url
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("assets.request_timeout_secs must be > 0"));
        }
        Ok(())
    }
}

impl AiConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(key) = std::env::var("GOOGLE_AI_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(endpoint) = std::env::var("AI_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint;
            }
        }
        while self.endpoint.ends_with('/') {
            self.endpoint.pop();
        }
    }

    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }
}
