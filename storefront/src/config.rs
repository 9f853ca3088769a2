// storefront/src/config.rs

use crate::errors::{AppError, Result};
use cartsync::store::http::DEFAULT_BASE_URL;
use cartsync::HttpStoreConfig;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pretty" | "" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!("Invalid LOG_FORMAT '{}': expected 'pretty' or 'json'", other))),
    }
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub cart_api_base_url: String,
  /// Bearer token for the cart service; requests go out unauthenticated without it.
  pub cart_api_token: Option<String>,
  pub cart_api_timeout: Duration,
  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|var_name| env::var(var_name).ok())
  }

  /// Builds the config from any variable source; `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| lookup(var_name).filter(|v| !v.trim().is_empty());

    let cart_api_base_url = get_env("CART_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let cart_api_token = get_env("CART_API_TOKEN");
    let timeout_secs = match get_env("CART_API_TIMEOUT_SECS") {
      Some(raw) => raw
        .trim()
        .parse::<u64>()
        .map_err(|e| AppError::Config(format!("Invalid CART_API_TIMEOUT_SECS '{}': {}", raw, e)))?,
      None => DEFAULT_TIMEOUT_SECS,
    };
    let log_format = get_env("LOG_FORMAT")
      .map(|raw| raw.parse::<LogFormat>())
      .transpose()?
      .unwrap_or(LogFormat::Pretty);

    Ok(Self {
      cart_api_base_url,
      cart_api_token,
      cart_api_timeout: Duration::from_secs(timeout_secs),
      log_format,
    })
  }

  pub fn http_store(&self) -> HttpStoreConfig {
    HttpStoreConfig {
      base_url: self.cart_api_base_url.clone(),
      timeout: Some(self.cart_api_timeout),
    }
  }
}

// Keeps the token out of logs.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("cart_api_base_url", &self.cart_api_base_url)
      .field("cart_api_token", &self.cart_api_token.as_ref().map(|_| "[REDACTED]"))
      .field("cart_api_timeout", &self.cart_api_timeout)
      .field("log_format", &self.log_format)
      .finish()
  }
}
