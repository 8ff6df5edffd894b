//! Common utilities shared across connectors.
//!
//! HTTP client creation, URL handling, dimension validation and mapping of
//! error responses.

use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default HTTP timeout for all connectors.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates a configured HTTP client with timeout.
#[must_use]
pub fn create_http_client() -> Client {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Validates that a URL uses an HTTP scheme.
pub fn validate_url(url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "Invalid URL scheme in '{}'. Allowed: http, https",
            url
        )));
    }

    if url.len() < 10 {
        return Err(Error::Config(format!("Invalid URL format: {}", url)));
    }

    Ok(())
}

/// Joins a base URL and a path without doubling slashes.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Prefixes `https://` to a bare host name.
pub fn with_scheme(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    }
}

/// Reads a collection dimension out of a statistics value.
///
/// The value must be present and a positive integer.
pub fn parse_dimension(value: Option<&Value>, collection: &str) -> Result<usize> {
    let invalid = |reason: String| Error::InvalidDimension {
        collection: collection.to_string(),
        reason,
    };

    match value {
        None | Some(Value::Null) => Err(invalid("dimension not reported".to_string())),
        Some(v) => match v.as_u64() {
            Some(0) => Err(invalid("dimension is 0".to_string())),
            Some(d) => usize::try_from(d).map_err(|_| invalid(format!("dimension {d} too large"))),
            None => Err(invalid(format!("{v} is not a positive integer"))),
        },
    }
}

/// Handles HTTP error responses and returns appropriate errors.
pub fn handle_http_error(status_code: u16, body: &str, service: &str, source_side: bool) -> Error {
    match status_code {
        401 | 403 => Error::Authentication(format!("{} auth failed: {}", service, body)),
        _ if source_side => {
            Error::SourceConnection(format!("{} error {}: {}", service, status_code, body))
        }
        _ => Error::DestinationConnection(format!("{} error {}: {}", service, status_code, body)),
    }
}

/// Turns a non-success response into an error, passing successes through.
pub async fn check_response(response: Response, service: &str, source_side: bool) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    Err(handle_http_error(status.as_u16(), &body, service, source_side))
}
