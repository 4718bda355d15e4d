use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_EMAIL_API_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub reconciler: ReconcilerConfig,
    pub cart: CartConfig,
    pub email: EmailConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub request_timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub cache_size: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Characters of raw model text kept in the fallback record.
    pub excerpt_limit: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CartConfig {
    pub path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EmailConfig {
    pub service_id: Option<String>,
    pub template_id: Option<String>,
    pub public_key: Option<String>,
    pub api_url: String,
    /// Log submissions instead of failing when EmailJS is not configured.
    pub dev_mode: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_seconds: 60,
            max_retries: 3,
            retry_delay_ms: 1000,
            cache_size: 64,
        }
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self { excerpt_limit: 500 }
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tutordesk-cart.json"),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            service_id: None,
            template_id: None,
            public_key: None,
            api_url: DEFAULT_EMAIL_API_URL.to_string(),
            dev_mode: false,
        }
    }
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        self.service_id.is_some() && self.template_id.is_some() && self.public_key.is_some()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

impl Config {
    /// Defaults, then the optional TOML file, then `.env` and process
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if dotenv::dotenv().is_ok() {
            debug!("Loaded .env file");
        }
        config.apply_vars(|var| std::env::var(var).ok())?;

        if config.api.api_key.is_none() {
            debug!("API_KEY is not set. AI features will not work.");
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides from a variable lookup; empty values are ignored.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("API_KEY") {
            self.api.api_key = Some(key);
        }
        if let Some(model) = get("MODEL") {
            self.api.model = model;
        }
        if let Some(url) = get("API_URL") {
            self.api.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = get("REQUEST_TIMEOUT_SECONDS") {
            self.api.request_timeout_seconds = parse_var("REQUEST_TIMEOUT_SECONDS", raw)?;
        }
        if let Some(raw) = get("MAX_RETRIES") {
            self.api.max_retries = parse_var("MAX_RETRIES", raw)?;
        }
        if let Some(path) = get("CART_PATH") {
            self.cart.path = PathBuf::from(path);
        }
        if let Some(id) = get("EMAILJS_SERVICE_ID") {
            self.email.service_id = Some(id);
        }
        if let Some(id) = get("EMAILJS_TEMPLATE_ID") {
            self.email.template_id = Some(id);
        }
        if let Some(key) = get("EMAILJS_PUBLIC_KEY") {
            self.email.public_key = Some(key);
        }
        if let Some(raw) = get("EMAILJS_DEV_MODE") {
            self.email.dev_mode = parse_var("EMAILJS_DEV_MODE", raw)?;
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
}

/// Validates that the required settings are present once the file and
/// environment overrides have been applied
///
/// # Required Variables
/// - `API_KEY`: Authentication key for the AI service
///
/// `MODEL` and `API_URL` are optional and fall back to the defaults above.
pub fn validate_environment(config: &Config) -> Result<(), String> {
    let required = [("API_KEY", config.api.api_key.as_deref())];
    let missing_vars: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(var, _)| *var)
        .collect();

    if missing_vars.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        ))
    }
}
