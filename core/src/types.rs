//! Record graph for one Wolfram|Alpha query and the parser that builds it.
//!
//! # Design
//! The `/v2/query` endpoint answers with an XML document rooted at
//! `<queryresult>`. Parsing is one forward walk over the document's events:
//! the first `<queryresult>` supplies the result attributes, every `<pod>`
//! contributes a section in document order, and each pod's `<subpod>`
//! children carry the content. Recognized attributes fall back to
//! type-appropriate defaults when missing or unparsable, so the only way a
//! payload is rejected is when no `<queryresult>` element exists at all.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// The full structured response to one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub success: bool,
    pub error: bool,
    pub version: Option<String>,
    pub datatypes: Option<String>,
    /// Seconds the service spent producing the result.
    pub timing: f64,
    /// Number of pods dropped because their scanners timed out.
    pub timed_out_pods: i32,
    pub parse_timing: f64,
    pub parse_timed_out: bool,
    /// Follow-up URL the service returns when pods or input parsing timed
    /// out, usable to fetch the missing data.
    pub recalculate_url: Option<String>,
    /// Pods in document order.
    pub pods: Vec<Pod>,
}

/// A titled section of a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub title: Option<String>,
    pub error: bool,
    /// Display ordering hint from the service. Pods are kept in document
    /// order regardless.
    pub position: i32,
    pub scanner_id: Option<String>,
    pub id: Option<String>,
    pub subpods: Vec<Subpod>,
}

/// The smallest content unit within a pod: an optional plain-text and an
/// optional image representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subpod {
    pub title: Option<String>,
    pub plaintext: Option<String>,
    pub image_url: Option<String>,
}

impl QueryResult {
    /// Parse a raw `/v2/query` response payload.
    ///
    /// Fails only when the document contains no `<queryresult>` element.
    /// A lexical error partway through ends the walk and keeps whatever was
    /// extracted before it.
    pub fn from_xml(xml: &str) -> Result<QueryResult, ApiError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut result: Option<QueryResult> = None;
        let mut pods: Vec<Pod> = Vec::new();
        let mut pod: Option<Pod> = None;
        let mut subpod: Option<Subpod> = None;
        let mut in_plaintext = false;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(_) => break,
            };
            match event {
                Event::Eof => break,
                Event::Start(e) => {
                    open_element(&e, &mut result, &mut pod, &mut subpod, &mut in_plaintext);
                }
                Event::Empty(e) => {
                    open_element(&e, &mut result, &mut pod, &mut subpod, &mut in_plaintext);
                    close_element(
                        e.local_name().as_ref(),
                        &mut pods,
                        &mut pod,
                        &mut subpod,
                        &mut in_plaintext,
                    );
                }
                Event::End(e) => {
                    close_element(
                        e.local_name().as_ref(),
                        &mut pods,
                        &mut pod,
                        &mut subpod,
                        &mut in_plaintext,
                    );
                }
                Event::Text(t) => {
                    if in_plaintext {
                        if let Some(sp) = subpod.as_mut() {
                            if let (Some(buf), Ok(text)) = (sp.plaintext.as_mut(), t.unescape()) {
                                buf.push_str(&text);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        match result {
            Some(mut query_result) => {
                query_result.pods = pods;
                Ok(query_result)
            }
            None => Err(ApiError::UnrecognisedQueryData),
        }
    }
}

fn open_element(
    e: &BytesStart,
    result: &mut Option<QueryResult>,
    pod: &mut Option<Pod>,
    subpod: &mut Option<Subpod>,
    in_plaintext: &mut bool,
) {
    match e.local_name().as_ref() {
        b"queryresult" if result.is_none() => {
            let attrs = attributes(e);
            *result = Some(QueryResult {
                success: attr_bool(&attrs, "success"),
                error: attr_bool(&attrs, "error"),
                version: attr_str(&attrs, "version"),
                datatypes: attr_str(&attrs, "datatypes"),
                timing: attr_f64(&attrs, "timing"),
                timed_out_pods: attr_int(&attrs, "timedoutpods"),
                parse_timing: attr_f64(&attrs, "parsetiming"),
                parse_timed_out: attr_bool(&attrs, "parsetimedout"),
                recalculate_url: attr_str(&attrs, "recalculate"),
                pods: Vec::new(),
            });
        }
        b"pod" if pod.is_none() => {
            let attrs = attributes(e);
            *pod = Some(Pod {
                title: attr_str(&attrs, "title"),
                error: attr_bool(&attrs, "error"),
                position: attr_int(&attrs, "position"),
                scanner_id: attr_str(&attrs, "scanner"),
                id: attr_str(&attrs, "id"),
                subpods: Vec::new(),
            });
        }
        b"subpod" if pod.is_some() && subpod.is_none() => {
            let attrs = attributes(e);
            *subpod = Some(Subpod {
                title: attr_str(&attrs, "title"),
                plaintext: None,
                image_url: None,
            });
        }
        b"plaintext" => {
            // Only the first plaintext of a subpod counts.
            if let Some(sp) = subpod.as_mut() {
                if sp.plaintext.is_none() {
                    sp.plaintext = Some(String::new());
                    *in_plaintext = true;
                }
            }
        }
        b"img" => {
            if let Some(sp) = subpod.as_mut() {
                if sp.image_url.is_none() {
                    let attrs = attributes(e);
                    sp.image_url = Some(attr_str(&attrs, "src").unwrap_or_default());
                }
            }
        }
        _ => {}
    }
}

fn close_element(
    name: &[u8],
    pods: &mut Vec<Pod>,
    pod: &mut Option<Pod>,
    subpod: &mut Option<Subpod>,
    in_plaintext: &mut bool,
) {
    match name {
        b"plaintext" => *in_plaintext = false,
        b"subpod" => {
            if let (Some(p), Some(sp)) = (pod.as_mut(), subpod.take()) {
                p.subpods.push(sp);
            }
        }
        b"pod" => {
            if let Some(p) = pod.take() {
                pods.push(p);
            }
        }
        _ => {}
    }
}

/// Collect an element's attributes into owned key/value pairs, dropping any
/// that fail to decode.
fn attributes(e: &BytesStart) -> HashMap<String, String> {
    e.attributes()
        .flatten()
        .filter_map(|a| {
            let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
            a.unescape_value().ok().map(|v| (key, v.into_owned()))
        })
        .collect()
}

fn attr_str(attrs: &HashMap<String, String>, key: &str) -> Option<String> {
    attrs.get(key).cloned()
}

/// Missing attributes are `false`; present ones follow the service's
/// `"true"`/`"false"` literals, compared case-insensitively.
fn attr_bool(attrs: &HashMap<String, String>, key: &str) -> bool {
    attrs.get(key).is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Missing or unparsable values coerce to 0.
fn attr_int(attrs: &HashMap<String, String>, key: &str) -> i32 {
    attrs.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
}

/// Missing or unparsable values coerce to 0.0.
fn attr_f64(attrs: &HashMap<String, String>, key: &str) -> f64 {
    attrs.get(key).and_then(|v| v.parse().ok()).unwrap_or(0.0)
}
