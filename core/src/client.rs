//! Wolfram|Alpha query client.
//!
//! # Design
//! `WolframClient` holds only the appid and the endpoint base URL, so a
//! clone is two strings and each asynchronous submission moves its own copy
//! onto a worker thread. Construction performs the one-off appid check
//! against the endpoint; afterwards every operation is the same
//! fetch-and-parse unit, executed on the caller's thread (`query`), on a
//! worker thread reporting through a callback (`queue_query`), or on a
//! worker thread reporting through a joinable handle (`submit_query`).

use std::thread::{self, JoinHandle};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ApiError;
use crate::http;
use crate::types::QueryResult;

/// Query endpoint of the live service.
pub const DEFAULT_ENDPOINT: &str = "http://api.wolframalpha.com";

/// Error code the service answers with when the appid is accepted but no
/// input was supplied. Seeing it on the no-input validation request means
/// the key itself is good.
const NO_INPUT_CODE: &str = "1000";

/// Client for the `/v2/query` endpoint. Holds an appid validated at
/// construction time.
#[derive(Debug, Clone)]
pub struct WolframClient {
    appid: String,
    base_url: String,
}

impl WolframClient {
    /// Validate `appid` against the live service and construct the client.
    ///
    /// Blocks the calling thread for the validation round-trip. A transport
    /// failure during validation is logged and ignored; only an explicit
    /// rejection from the service fails construction.
    pub fn new(appid: &str) -> Result<WolframClient, ApiError> {
        Self::with_endpoint(appid, DEFAULT_ENDPOINT)
    }

    /// Same as [`WolframClient::new`], against a caller-chosen endpoint.
    pub fn with_endpoint(appid: &str, base_url: &str) -> Result<WolframClient, ApiError> {
        let client = Self::unvalidated(appid, base_url);
        client.validate_appid()?;
        Ok(client)
    }

    fn unvalidated(appid: &str, base_url: &str) -> WolframClient {
        WolframClient {
            appid: appid.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The key this client was constructed with.
    pub fn appid(&self) -> &str {
        &self.appid
    }

    fn validate_appid(&self) -> Result<(), ApiError> {
        match http::fetch_text(&self.build_validation_url()) {
            Ok(body) => {
                if appid_rejected(&body) {
                    return Err(ApiError::InvalidAppid(self.appid.clone()));
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("appid validation request failed, skipping check: {e}");
                Ok(())
            }
        }
    }

    pub fn build_validation_url(&self) -> String {
        format!("{}/v2/query?appid={}", self.base_url, self.appid)
    }

    /// The input is embedded as given; callers supply a URL-safe string.
    pub fn build_query_url(&self, input: &str) -> String {
        format!("{}/v2/query?input={}&appid={}", self.base_url, input, self.appid)
    }

    /// Execute a query on the calling thread.
    ///
    /// Returns `None` on any transport or parse failure; failures are
    /// logged, not surfaced, so an empty answer and a failed request look
    /// the same here.
    pub fn query(&self, input: &str) -> Option<QueryResult> {
        let body = match http::fetch_text(&self.build_query_url(input)) {
            Ok(body) => body,
            Err(e) => {
                log::error!("query fetch failed for {input:?}: {e}");
                return None;
            }
        };
        match QueryResult::from_xml(&body) {
            Ok(result) => Some(result),
            Err(e) => {
                log::error!("query response for {input:?} not understood: {e}");
                None
            }
        }
    }

    /// Run the query on a worker thread and hand the outcome to `callback`.
    ///
    /// The callback is invoked exactly once, with `None` on failure.
    pub fn queue_query<F>(&self, input: &str, callback: F)
    where
        F: FnOnce(Option<QueryResult>) + Send + 'static,
    {
        let client = self.clone();
        let input = input.to_string();
        thread::spawn(move || callback(client.query(&input)));
    }

    /// Run the query on a worker thread and return a handle to the pending
    /// result.
    pub fn submit_query(&self, input: &str) -> QueryTask {
        let client = self.clone();
        let input = input.to_string();
        QueryTask {
            handle: thread::spawn(move || client.query(&input)),
        }
    }
}

/// Handle to a query running on a worker thread.
///
/// There is no cancellation: once submitted, the underlying fetch runs to
/// completion whether or not the handle is kept.
#[derive(Debug)]
pub struct QueryTask {
    handle: JoinHandle<Option<QueryResult>>,
}

impl QueryTask {
    /// Block until the query finishes. A worker that panicked resolves to
    /// `None`.
    pub fn wait(self) -> Option<QueryResult> {
        self.handle.join().unwrap_or(None)
    }

    /// Whether the query has finished, without blocking.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Interpret the no-input validation response: the first `<error>`
/// element's first `<code>` child decides. Any code other than the
/// no-input sentinel rejects the key; an absent `<error>` or an `<error>`
/// without a `<code>` child counts as acceptance.
fn appid_rejected(xml: &str) -> bool {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_error = false;
    let mut in_code = false;
    let mut code = String::new();
    loop {
        match reader.read_event() {
            Err(_) | Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"error" if !in_error => in_error = true,
                b"code" if in_error && !in_code => in_code = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                // An error element with no children carries no code.
                b"error" if !in_error => return false,
                // An empty code element's text is not the sentinel.
                b"code" if in_error && !in_code => return true,
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if in_code {
                    if let Ok(text) = t.unescape() {
                        code.push_str(&text);
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"code" if in_code => return code != NO_INPUT_CODE,
                b"error" if in_error => return false,
                _ => {}
            },
            _ => {}
        }
    }
    false
}
