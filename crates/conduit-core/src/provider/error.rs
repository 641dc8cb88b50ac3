//! Provider-neutral error taxonomy

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

const MAX_ERROR_TEXT_CHARS: usize = 1_024;
const REDACTED: &str = "[REDACTED]";

static BEARER_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bBearer\s+[A-Za-z0-9._\-+/=]{8,}").expect("valid bearer token regex")
});

static KEY_VALUE_SECRET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(api[_-]?key|access[_-]?token|token|secret|password|authorization)\b\s*[:=]\s*["']?[^"',\s}]+"#,
    )
    .expect("valid key/value secret regex")
});

/// Failure reported by a provider adapter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Malformed request: {message}")]
    MalformedRequest { message: String },

    #[error("Transient network error: {message}")]
    TransientNetwork { message: String },

    #[error("Content filtered: {message}")]
    ContentFiltered { message: String },

    #[error("Provider error: {message}")]
    Other { message: String },
}

impl ProviderError {
    pub fn rate_limited(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientNetwork {
            message: message.into(),
        }
    }

    pub fn content_filtered(message: impl Into<String>) -> Self {
        Self::ContentFiltered {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        let detail = format!("status {}: {}", status, sanitize_error_text(body));
        match status {
            401 | 403 => Self::authentication(detail),
            429 => Self::rate_limited(detail, retry_after),
            400 | 404 | 413 | 422 => {
                if body.contains("content_filter") || body.contains("content_policy") {
                    Self::content_filtered(detail)
                } else {
                    Self::malformed(detail)
                }
            }
            408 | 500..=599 => Self::transient(detail),
            _ => Self::other(detail),
        }
    }

    /// Rate limits and transient network failures may succeed on retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::TransientNetwork { .. })
    }

    /// Delay requested by the provider, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::Authentication { .. } => "authentication",
            Self::MalformedRequest { .. } => "malformed_request",
            Self::TransientNetwork { .. } => "transient_network",
            Self::ContentFiltered { .. } => "content_filtered",
            Self::Other { .. } => "other",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        let message = sanitize_error_text(&error.to_string());
        if let Some(status) = error.status() {
            return Self::from_status(status.as_u16(), &message, None);
        }
        if error.is_timeout() || error.is_connect() || error.is_request() || error.is_body() {
            Self::transient(message)
        } else if error.is_decode() {
            Self::other(format!("Failed to decode response: {}", message))
        } else {
            Self::other(message)
        }
    }
}

/// Redact secrets from provider error text and truncate large payloads
pub fn sanitize_error_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "<empty error response body>".to_string();
    }

    if let Ok(mut json) = serde_json::from_str::<Value>(trimmed) {
        redact_json_value(&mut json);
        let serialized =
            serde_json::to_string(&json).unwrap_or_else(|_| "<unserializable error>".to_string());
        return truncate_with_suffix(serialized);
    }

    truncate_with_suffix(redact_inline_secrets(trimmed))
}

fn redact_json_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *val = Value::String(REDACTED.to_string());
                } else {
                    redact_json_value(val);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json_value),
        Value::String(s) => *s = redact_inline_secrets(s),
        _ => {}
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.to_ascii_lowercase().replace(['-', ' '], "_");
    ["api_key", "token", "secret", "password", "authorization", "cookie"]
        .iter()
        .any(|needle| normalized.contains(needle))
}

fn redact_inline_secrets(input: &str) -> String {
    let redacted_bearer = BEARER_TOKEN_RE.replace_all(input, "Bearer [REDACTED]");
    KEY_VALUE_SECRET_RE
        .replace_all(&redacted_bearer, "$1=[REDACTED]")
        .into_owned()
}

fn truncate_with_suffix(input: String) -> String {
    let char_count = input.chars().count();
    if char_count <= MAX_ERROR_TEXT_CHARS {
        return input;
    }

    let truncated: String = input.chars().take(MAX_ERROR_TEXT_CHARS).collect();
    format!(
        "{}... [truncated {} chars]",
        truncated,
        char_count - MAX_ERROR_TEXT_CHARS
    )
}
