use anyhow::{bail, Result};
use serde_json::Value;

/// Overrides `api.base_url` when set and non-blank.
pub const API_URL_ENV: &str = "BODEGA_API_URL";

/// Typed view of the settings the workspace reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub access_token_env: String,
    pub refresh_token_env: String,
    pub timeout_secs: u64,
    pub timezone: String,
    pub datetime_format: String,
    pub export_root: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/".to_string(),
            access_token_env: "BODEGA_ACCESS_TOKEN".to_string(),
            refresh_token_env: "BODEGA_REFRESH_TOKEN".to_string(),
            timeout_secs: 30,
            timezone: "America/Santiago".to_string(),
            datetime_format: "%d-%m-%Y %H:%M:%S".to_string(),
            export_root: "exports".to_string(),
        }
    }
}

fn read_str(config: &Value, pointer: &str) -> Result<Option<String>> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => bail!("CONFIG_TYPE {pointer}: expected string, got {other}"),
    }
}

impl AppConfig {
    /// Missing keys fall back to [`AppConfig::default`]; wrongly typed keys
    /// are an error.
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let d = Self::default();

        let timeout_secs = match config.pointer("/api/timeout_secs") {
            None | Some(Value::Null) => d.timeout_secs,
            Some(v) => match v.as_u64() {
                Some(n) if n > 0 => n,
                _ => bail!("CONFIG_TYPE /api/timeout_secs: expected positive integer, got {v}"),
            },
        };

        let mut api_base_url = read_str(config, "/api/base_url")?.unwrap_or(d.api_base_url);
        if !api_base_url.ends_with('/') {
            api_base_url.push('/');
        }

        Ok(Self {
            api_base_url,
            access_token_env: read_str(config, "/api/access_token_env")?
                .unwrap_or(d.access_token_env),
            refresh_token_env: read_str(config, "/api/refresh_token_env")?
                .unwrap_or(d.refresh_token_env),
            timeout_secs,
            timezone: read_str(config, "/display/timezone")?.unwrap_or(d.timezone),
            datetime_format: read_str(config, "/display/datetime_format")?
                .unwrap_or(d.datetime_format),
            export_root: read_str(config, "/export/root")?.unwrap_or(d.export_root),
        })
    }

    /// Apply env overrides through `lookup` (normally `std::env::var`).
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
            if !self.api_base_url.ends_with('/') {
                self.api_base_url.push('/');
            }
        }
        self
    }
}
