//! Mock Wolfram|Alpha query endpoint for integration tests.
//!
//! Serves `/v2/query` with the same XML shapes the live service uses: an
//! invalid-appid error document, the no-input sentinel document, and a
//! success document whose input-interpretation pod echoes the query so
//! tests can trace every result back to its input.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;

/// Query-string parameters recognized by the endpoint.
#[derive(Deserialize)]
pub struct QueryParams {
    pub appid: Option<String>,
    pub input: Option<String>,
}

pub fn app(valid_appid: &str) -> Router {
    let state: Arc<String> = Arc::new(valid_appid.to_string());
    Router::new().route("/v2/query", get(query)).with_state(state)
}

pub async fn run(listener: TcpListener, valid_appid: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(valid_appid)).await
}

async fn query(
    State(valid_appid): State<Arc<String>>,
    Query(params): Query<QueryParams>,
) -> impl IntoResponse {
    let body = match (params.appid.as_deref(), params.input.as_deref()) {
        (Some(appid), Some(input)) if appid == valid_appid.as_str() => success_document(input),
        (Some(appid), None) if appid == valid_appid.as_str() => {
            error_document(1000, "No input given")
        }
        _ => error_document(1, "Invalid appid"),
    };
    ([(header::CONTENT_TYPE, "application/xml")], body)
}

fn error_document(code: u32, msg: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<queryresult success="false" error="true" version="2.6">"#,
            "<error><code>{code}</code><msg>{msg}</msg></error>",
            "</queryresult>",
        ),
        code = code,
        msg = xml_escape(msg),
    )
}

fn success_document(input: &str) -> String {
    let input = xml_escape(input);
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<queryresult success="true" error="false" version="2.6" datatypes="" "#,
            r#"timing="0.35" parsetiming="0.12" timedoutpods="0" parsetimedout="false">"#,
            r#"<pod title="Input interpretation" error="false" position="100" scanner="Identity" id="Input">"#,
            r#"<subpod title=""><plaintext>{input}</plaintext></subpod>"#,
            "</pod>",
            r#"<pod title="Result" error="false" position="200" scanner="Simplification" id="Result">"#,
            r#"<subpod title=""><plaintext>result of {input}</plaintext>"#,
            r#"<img src="http://mock.invalid/image/{input}.gif" alt="{input}"/>"#,
            "</subpod></pod></queryresult>",
        ),
        input = input,
    )
}

/// Minimal escaping for text dropped into XML content or attributes.
fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
