//! Structured logging and secret redaction utilities.
//!
//! This module configures the `tracing` ecosystem for the service and
//! provides a sanitizer so that the Gemini API key, which travels as a
//! `?key=` query parameter, never ends up in a log sink.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::{DetectorError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// Output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `compact`: One line per event.
/// - `pretty` (default): Human-readable, colorized output for development.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match config.format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        "compact" => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };

    installed.map_err(|e| DetectorError::Internal(format!("Failed to install logger: {}", e)))
}

/// Sanitizes credentials from log messages.
///
/// Replaces the value of any `key=` query parameter and any bare Google API
/// key (these start with `AIza`) with a redaction marker.
pub fn sanitize(input: &str) -> String {
    let mut result = redact_after(input, "key=", "[REDACTED_API_KEY]");
    result = redact_after(&result, "AIza", "[REDACTED_API_KEY]");
    result
}

/// Replace every token that starts at `marker` (marker included unless it is a
/// query parameter name) up to the next delimiter.
fn redact_after(input: &str, marker: &str, replacement: &str) -> String {
    let keep_marker = marker.ends_with('=');
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find(marker) {
        let (head, tail) = rest.split_at(pos);
        output.push_str(head);

        let value_start = marker.len();
        let end = tail[value_start..]
            .find(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '&' | ')'))
            .map(|i| value_start + i)
            .unwrap_or(tail.len());

        if keep_marker {
            output.push_str(marker);
        }
        output.push_str(replacement);
        rest = &tail[end..];
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_query_key() {
        let input = "error sending request for url (https://example.com/v1:generateContent?key=secret123&alt=json)";
        let output = sanitize(input);
        assert!(output.contains("key=[REDACTED_API_KEY]&alt=json"));
        assert!(!output.contains("secret123"));
    }

    #[test]
    fn test_sanitize_bare_api_key() {
        let output = sanitize("using AIzaSyD-abcdef for call");
        assert_eq!(output, "using [REDACTED_API_KEY] for call");
    }

    #[test]
    fn test_sanitize_leaves_plain_text() {
        assert_eq!(sanitize("nothing to hide"), "nothing to hide");
    }
}
