use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

use docqa_core::{Error, Result};

pub(crate) fn generation_err(provider: &str, e: impl std::fmt::Display) -> Error {
    Error::Generation(format!("{provider}: {e}"))
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| generation_err("http client", e))
}

/// Reads the key named by `env_var`; a blank value counts as missing.
pub(crate) fn api_key_from_env(env_var: &str) -> Option<String> {
    std::env::var(env_var).ok().filter(|k| !k.trim().is_empty())
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Returns the body of a successful response, or the provider's error message.
pub(crate) fn success_body(provider: &str, response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().map_err(|e| generation_err(provider, e))?;
    if status.is_success() {
        return Ok(body);
    }
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|r| r.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    Err(generation_err(provider, format!("HTTP {status}: {message}")))
}

/// Trims `text`, rejecting an empty answer.
pub(crate) fn non_empty(provider: &str, text: String) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(generation_err(provider, "empty answer"));
    }
    Ok(trimmed.to_string())
}
