//! Response shaping: picks JSON or HTML per request and renders both
//! successful results and errors.

use std::any::Any;
use std::convert::Infallible;

use axum::async_trait;
use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use stats::{Operation, Outcome};
use tracing::error;

use crate::error::AppError;
use crate::payload;

pub const LANDING_MESSAGE: &str = "Welcome to the statistics API. Use the following routes with a `nums` query parameter: /mean, /median, /mode, /all. Add `save=true` to save results.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Json,
    Html,
}

impl RenderMode {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(http::header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(Self::from_accept)
            .unwrap_or(RenderMode::Json)
    }

    /// HTML only when the client names an HTML type explicitly and ranks it at
    /// least as high as JSON. Wildcards never select HTML.
    pub fn from_accept(accept: &str) -> Self {
        let mut html: Option<(f32, usize)> = None;
        let mut json: Option<(f32, usize)> = None;

        for (pos, item) in accept.split(',').enumerate() {
            let mut parts = item.split(';');
            let media = parts.next().unwrap_or("").trim().to_ascii_lowercase();
            // A range with an unusable q-value is ignored.
            let Some(q) = quality(parts) else {
                continue;
            };

            let slot = match media.as_str() {
                "text/html" | "application/xhtml+xml" => &mut html,
                "application/json" => &mut json,
                _ => continue,
            };
            if !matches!(*slot, Some((best, _)) if best >= q) {
                *slot = Some((q, pos));
            }
        }

        match (html, json) {
            (Some((hq, _)), None) if hq > 0.0 => RenderMode::Html,
            (Some((hq, hpos)), Some((jq, jpos)))
                if hq > 0.0 && (hq > jq || (hq == jq && hpos < jpos)) =>
            {
                RenderMode::Html
            }
            _ => RenderMode::Json,
        }
    }
}

/// The `q` parameter of one media range: 1.0 when absent, `None` when it is
/// not a number in `0..=1`.
fn quality<'a>(params: impl Iterator<Item = &'a str>) -> Option<f32> {
    for param in params {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("q") {
            return value
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|q| (0.0..=1.0).contains(q));
        }
    }
    Some(1.0)
}

#[async_trait]
impl<S> FromRequestParts<S> for RenderMode
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RenderMode::from_headers(&parts.headers))
    }
}

/// What a successful request renders.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Landing,
    Outcome(Outcome),
}

impl Page {
    pub fn to_json(&self) -> Value {
        match self {
            Page::Landing => json!({ "message": LANDING_MESSAGE }),
            Page::Outcome(outcome) => payload::response_body(outcome),
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            Page::Landing => landing_html(),
            Page::Outcome(Outcome::All(summary)) => {
                let body = format!(
                    "<h1>ALL RESULTS</h1>\n<p>Mean: <strong>{}</strong></p>\n<p>Median: <strong>{}</strong></p>\n<p>Mode: <strong>{}</strong></p>",
                    summary.mean,
                    summary.median,
                    join_values(&summary.mode)
                );
                page("All Results", &body)
            }
            Page::Outcome(Outcome::Mean(v)) => single_value_html(Operation::Mean, &v.to_string()),
            Page::Outcome(Outcome::Median(v)) => {
                single_value_html(Operation::Median, &v.to_string())
            }
            Page::Outcome(Outcome::Mode(modes)) => {
                single_value_html(Operation::Mode, &join_values(modes))
            }
        }
    }
}

pub struct Reply {
    pub mode: RenderMode,
    pub page: Page,
}

impl Reply {
    pub fn new(mode: RenderMode, page: Page) -> Self {
        Self { mode, page }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.mode {
            RenderMode::Json => Json(self.page.to_json()).into_response(),
            RenderMode::Html => Html(self.page.to_html()).into_response(),
        }
    }
}

/// The single exit point for failed requests.
pub struct Failure {
    pub mode: RenderMode,
    pub error: AppError,
}

impl Failure {
    pub fn new(mode: RenderMode, error: impl Into<AppError>) -> Self {
        Self {
            mode,
            error: error.into(),
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let status = self.error.status();
        if status.is_server_error() {
            error!("request failed: {}", self.error);
        }
        let message = self.error.public_message();

        match self.mode {
            RenderMode::Json => (
                status,
                Json(json!({ "error": { "message": message, "status": status.as_u16() } })),
            )
                .into_response(),
            RenderMode::Html => {
                let body = format!(
                    "<h1>Error {}</h1>\n<p>{}</p>",
                    status.as_u16(),
                    escape_html(&message)
                );
                (status, Html(page("Error", &body))).into_response()
            }
        }
    }
}

/// Response for a handler that panicked. No request context is left, so JSON.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    Failure::new(RenderMode::Json, AppError::Unclassified(detail)).into_response()
}

fn single_value_html(op: Operation, value: &str) -> String {
    let name = op.as_str();
    let body = format!(
        "<h1>{}</h1>\n<p>Value: <strong>{}</strong></p>",
        name.to_uppercase(),
        escape_html(value)
    );
    page(name, &body)
}

fn join_values(values: &[f64]) -> String {
    if values.is_empty() {
        return "no mode".to_string();
    }
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn landing_html() -> String {
    let mut items = String::new();
    for op in Operation::ALL {
        items.push_str(&format!("<li><code>/{op}?nums=1,2,3</code></li>\n"));
    }
    let body = format!(
        "<h1>Statistics API</h1>\n<p>Available routes:</p>\n<ul>\n{items}</ul>\n<p>Add <code>save=true</code> to any route to save the result.</p>"
    );
    page("Statistics API", &body)
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n<title>{}</title>\n<style>body {{ font-family: sans-serif; margin: 3rem auto; max-width: 32rem; }}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape_html(title)
    )
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
