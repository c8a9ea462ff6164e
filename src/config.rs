// src/config.rs
use std::path::Path;

use anyhow::{bail, Context, Result};

pub const ENV_ENDPOINT: &str = "NOTESTORE_ENDPOINT";
pub const DEFAULT_ENDPOINT: &str = "https://notestore.example.com/api/v1";

/// Reads the bearer token file once at startup, trimmed. The token is
/// treated as an opaque string from here on.
pub fn load_auth_token(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading auth token from {}", path.display()))?;
    let token = raw.trim().to_string();
    if token.is_empty() {
        bail!("auth token file {} is empty", path.display());
    }
    Ok(token)
}

/// Endpoint resolution: explicit flag, then $NOTESTORE_ENDPOINT, then the
/// built-in default.
pub fn endpoint(flag: Option<String>) -> String {
    flag.or_else(|| std::env::var(ENV_ENDPOINT).ok())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}
