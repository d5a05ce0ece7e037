//! Client library for the Wolfram|Alpha v2 query API.
//!
//! # Overview
//! A query is one HTTP GET against `/v2/query`, answered with an XML
//! document that deserializes into [`QueryResult`] → [`Pod`] → [`Subpod`].
//! [`WolframClient`] validates the appid once at construction and then
//! offers the same fetch-and-parse operation in three forms: blocking
//! ([`WolframClient::query`]), callback on a worker thread
//! ([`WolframClient::queue_query`]), and joinable handle
//! ([`WolframClient::submit_query`]).
//!
//! # Design
//! - The parser never rejects a payload over a missing or malformed
//!   attribute; only a document with no `<queryresult>` element fails.
//! - Transport failures inside query operations are logged and collapsed
//!   to `None`; construction is the one place a typed rejection
//!   ([`ApiError::InvalidAppid`]) escapes.
//! - The client holds nothing but the appid and endpoint, so clones are
//!   cheap and worker threads share no mutable state.

pub mod client;
pub mod error;
pub mod http;
pub mod types;

pub use client::{QueryTask, WolframClient, DEFAULT_ENDPOINT};
pub use error::ApiError;
pub use types::{Pod, QueryResult, Subpod};
