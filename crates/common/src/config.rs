//! Application configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Hosted backend (row store, storage, auth, realtime) configuration.
    pub backend: BackendConfig,
    /// Chatbot relay configuration.
    #[serde(default)]
    pub chatbot: ChatbotConfig,
}

/// Hosted backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public anonymous API key sent as `apikey` on every request.
    pub anon_key: String,
    /// Storage bucket that holds complaint attachments.
    #[serde(default = "default_bucket")]
    pub attachments_bucket: String,
    /// Lifetime of signed attachment URLs, in seconds.
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: u64,
    /// Timeout applied to every backend request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl BackendConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Chatbot relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatbotConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Chat completions endpoint of the AI gateway.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// Bearer key for the AI gateway. Empty means not configured.
    #[serde(default)]
    pub gateway_api_key: String,
    /// Model name forwarded to the gateway.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            gateway_url: default_gateway_url(),
            gateway_api_key: String::new(),
            model: default_model(),
        }
    }
}

fn default_bucket() -> String {
    "complaint-attachments".to_string()
}

const fn default_signed_url_ttl() -> u64 {
    3600
}

const fn default_request_timeout() -> u64 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8787
}

fn default_gateway_url() -> String {
    "https://ai.gateway.lovable.dev/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "google/gemini-2.5-flash".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `BROTO_ENV`)
    /// 4. Environment variables with `BROTO__` prefix, e.g. `BROTO__BACKEND__URL`
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let env = std::env::var("BROTO_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BROTO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("BROTO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Configuration pointing at a given backend URL, with defaults elsewhere.
    #[must_use]
    pub fn for_backend(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            backend: BackendConfig {
                url: url.into(),
                anon_key: anon_key.into(),
                attachments_bucket: default_bucket(),
                signed_url_ttl_secs: default_signed_url_ttl(),
                request_timeout_secs: default_request_timeout(),
            },
            chatbot: ChatbotConfig::default(),
        }
    }
}
