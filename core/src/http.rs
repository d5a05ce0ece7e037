//! Blocking HTTP fetch for the query endpoint.
//!
//! # Design
//! One round-trip shape: GET a URL, return the body text. Status codes are
//! not interpreted; the service describes failures inside the XML payload
//! itself, so non-2xx bodies are read like any other. Transport failures
//! are the only errors this layer produces; the client decides whether to
//! surface or swallow them.

use crate::error::ApiError;

/// Fetch `url` and return the response body as text.
pub fn fetch_text(url: &str) -> Result<String, ApiError> {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = agent
        .get(url)
        .call()
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::Transport(e.to_string()))
}
