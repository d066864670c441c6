//! Token resolution from the environment.
//!
//! Config names the env vars; values are read here, once, and handed to the
//! session. Errors and `Debug` output mention names only.

use crate::app::AppConfig;

#[derive(Clone, Default)]
pub struct ResolvedSecrets {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("access_token", &self.access_token.as_ref().map(|_| "<REDACTED>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Both tokens are optional here; the client decides whether it can run
/// without them.
pub fn resolve_secrets(cfg: &AppConfig) -> ResolvedSecrets {
    ResolvedSecrets {
        access_token: resolve_env(&cfg.access_token_env),
        refresh_token: resolve_env(&cfg.refresh_token_env),
    }
}
