use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use stats::{evaluate, parse_nums, Operation, Outcome};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::payload;
use crate::render::{panic_response, Failure, Page, RenderMode, Reply};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub nums: Option<String>,
    pub save: Option<String>,
}

impl StatsQuery {
    /// Only the literal `true` turns saving on.
    pub fn wants_save(&self) -> bool {
        self.save.as_deref() == Some("true")
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/", get(index).fallback(method_not_allowed))
        .route("/healthz", get(healthz).fallback(method_not_allowed))
        .route("/mean", get(mean).fallback(method_not_allowed))
        .route("/median", get(median).fallback(method_not_allowed))
        .route("/mode", get(mode).fallback(method_not_allowed))
        .route("/all", get(all).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(mode: RenderMode) -> Reply {
    Reply::new(mode, Page::Landing)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn not_found(mode: RenderMode) -> Failure {
    Failure::new(mode, AppError::NotFound)
}

async fn method_not_allowed(mode: RenderMode) -> Failure {
    Failure::new(mode, AppError::MethodNotAllowed)
}

async fn mean(
    State(state): State<AppState>,
    mode: RenderMode,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Reply, Failure> {
    run(&state, Operation::Mean, mode, query).await
}

async fn median(
    State(state): State<AppState>,
    mode: RenderMode,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Reply, Failure> {
    run(&state, Operation::Median, mode, query).await
}

async fn mode(
    State(state): State<AppState>,
    mode: RenderMode,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Reply, Failure> {
    run(&state, Operation::Mode, mode, query).await
}

async fn all(
    State(state): State<AppState>,
    mode: RenderMode,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Reply, Failure> {
    run(&state, Operation::All, mode, query).await
}

async fn run(
    state: &AppState,
    op: Operation,
    mode: RenderMode,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Reply, Failure> {
    let Query(query) = query.map_err(|e| Failure::new(mode, AppError::Validation(e.body_text())))?;
    let outcome = compute(state, op, &query)
        .await
        .map_err(|e| Failure::new(mode, e))?;
    Ok(Reply::new(mode, Page::Outcome(outcome)))
}

/// Parse, evaluate and, when asked, save before anything is returned.
pub async fn compute(
    state: &AppState,
    op: Operation,
    query: &StatsQuery,
) -> Result<Outcome, AppError> {
    let nums = parse_nums(query.nums.as_deref())?;
    let outcome = evaluate(op, &nums);
    if query.wants_save() {
        state
            .results
            .append(op, payload::saved_value(&outcome))
            .await?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::router;
    use crate::results::ResultStore;
    use crate::AppState;

    fn test_app(dir: &TempDir) -> (Router, Arc<ResultStore>) {
        let results = Arc::new(ResultStore::new(dir.path().join("results.json")));
        let app = router(AppState {
            results: results.clone(),
        });
        (app, results)
    }

    async fn get(app: &Router, uri: &str, accept: &str) -> (StatusCode, String) {
        let req = Request::builder()
            .uri(uri)
            .header(header::ACCEPT, accept)
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = get(app, uri, "application/json").await;
        (status, serde_json::from_str(&body).unwrap())
    }

    #[tokio::test]
    async fn mean_of_odd_list() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        let (status, body) = get_json(&app, "/mean?nums=1,3,5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"operation": "mean", "value": 3}));
    }

    #[tokio::test]
    async fn median_and_mode_routes() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);

        let (status, body) = get_json(&app, "/median?nums=1,3,5,7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"operation": "median", "value": 4}));

        let (status, body) = get_json(&app, "/mode?nums=1,1,2,3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"operation": "mode", "value": [1]}));

        let (_, body) = get_json(&app, "/mode?nums=1,2,3").await;
        assert_eq!(body["value"], json!([]));
    }

    #[tokio::test]
    async fn all_route_is_flat() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        let (status, body) = get_json(&app, "/all?nums=1,1,2,2,3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"operation": "all", "mean": 1.8, "median": 2, "mode": [1, 2]})
        );
    }

    #[tokio::test]
    async fn all_agrees_with_individual_routes() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        let nums = "4,-1,2.5,4,10";

        let (_, all) = get_json(&app, &format!("/all?nums={nums}")).await;
        for op in ["mean", "median", "mode"] {
            let (_, single) = get_json(&app, &format!("/{op}?nums={nums}")).await;
            assert_eq!(all[op], single["value"], "{op} diverged");
        }
    }

    #[tokio::test]
    async fn invalid_number_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        let (status, body) = get_json(&app, "/mean?nums=1,foo,3").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let msg = body["error"]["message"].as_str().unwrap();
        assert!(msg.contains("foo"));
        assert!(msg.contains("is not a number"));
        assert_eq!(body["error"]["status"], json!(400));
    }

    #[tokio::test]
    async fn missing_nums_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        for uri in ["/mean", "/median?nums=", "/all?save=true"] {
            let (status, body) = get_json(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("nums are required"));
        }
    }

    #[tokio::test]
    async fn save_appends_one_record() {
        let dir = TempDir::new().unwrap();
        let (app, results) = test_app(&dir);

        let (status, _) = get_json(&app, "/mode?nums=1,1,2,2,3&save=true").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get_json(&app, "/all?nums=1,2,3&save=true").await;
        assert_eq!(status, StatusCode::OK);

        let records = results.records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].operation, "mode");
        assert_eq!(records[0].value, json!([1, 2]));
        assert_eq!(records[1].operation, "all");
        assert_eq!(
            records[1].value,
            json!({"operation": "all", "mean": 2, "median": 2, "mode": []})
        );
    }

    #[tokio::test]
    async fn only_literal_true_saves() {
        let dir = TempDir::new().unwrap();
        let (app, results) = test_app(&dir);
        for uri in [
            "/mean?nums=1,2",
            "/mean?nums=1,2&save=TRUE",
            "/mean?nums=1,2&save=1",
        ] {
            let (status, _) = get_json(&app, uri).await;
            assert_eq!(status, StatusCode::OK);
        }
        assert!(results.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_input_is_never_saved() {
        let dir = TempDir::new().unwrap();
        let (app, results) = test_app(&dir);
        let (status, _) = get_json(&app, "/mean?nums=1,x&save=true").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(results.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_failure_is_server_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();
        let app = router(AppState {
            results: Arc::new(ResultStore::new(path)),
        });

        let (status, body) = get_json(&app, "/mean?nums=1,2&save=true").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"error": {"message": "failed to save result", "status": 500}})
        );
    }

    #[tokio::test]
    async fn html_when_explicitly_accepted() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);

        let (status, body) = get(&app, "/mean?nums=1,3,5", "text/html").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("<h1>MEAN</h1>"));
        assert!(body.contains("<strong>3</strong>"));

        let (status, body) = get(&app, "/mean?nums=1,%3Cb%3E", "text/html").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Error 400"));
        assert!(body.contains("&lt;b&gt; is not a number."));
    }

    #[tokio::test]
    async fn wildcard_accept_gets_json() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        let (status, body) = get(&app, "/median?nums=1,2,3", "*/*").await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({"operation": "median", "value": 2}));
    }

    #[tokio::test]
    async fn landing_page_lists_routes() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);

        let (status, body) = get_json(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        let msg = body["message"].as_str().unwrap();
        for route in ["/mean", "/median", "/mode", "/all"] {
            assert!(msg.contains(route));
        }

        let (_, html) = get(&app, "/", "text/html").await;
        assert!(html.contains("/all?nums=1,2,3"));
    }

    #[tokio::test]
    async fn unknown_and_case_mismatched_routes_are_not_found() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        for uri in ["/sum?nums=1", "/MEAN?nums=1"] {
            let (status, body) = get_json(&app, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["error"]["status"], json!(404));
        }
    }

    #[tokio::test]
    async fn wrong_method_uses_the_error_body() {
        let dir = TempDir::new().unwrap();
        let (app, results) = test_app(&dir);
        for uri in ["/mean?nums=1,2&save=true", "/all?nums=1,2", "/"] {
            let req = Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::ACCEPT, "application/json")
                .body(Body::empty())
                .unwrap();
            let resp = app.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{uri}");
            let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(
                body,
                json!({"error": {"message": "Method Not Allowed", "status": 405}})
            );
        }
        assert!(results.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        let (status, body) = get(&app, "/healthz", "*/*").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
