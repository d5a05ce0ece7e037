//! Error types for the Wolfram|Alpha client.
//!
//! # Design
//! Only two conditions are caller-distinguishable: a payload without a
//! `<queryresult>` root and an appid the service explicitly rejected.
//! Transport trouble gets its own variant at the fetch boundary, but the
//! query methods collapse it into an absent result and log it instead of
//! returning it.

use std::fmt;

/// Errors surfaced by client construction and response parsing.
#[derive(Debug)]
pub enum ApiError {
    /// The payload contained no `<queryresult>` element.
    UnrecognisedQueryData,

    /// The service rejected the appid during client construction. Carries
    /// the rejected key.
    InvalidAppid(String),

    /// Network or I/O failure while fetching from the endpoint.
    Transport(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::UnrecognisedQueryData => {
                write!(f, "response did not contain a queryresult element")
            }
            ApiError::InvalidAppid(appid) => {
                write!(f, "appid rejected by the service: {appid}")
            }
            ApiError::Transport(msg) => write!(f, "transport failure: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}
