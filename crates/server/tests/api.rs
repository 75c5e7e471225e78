use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use db::DBService;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::AppState;
use services::services::storage::FileStorage;
use tower::ServiceExt;

async fn app(asset_dir: &std::path::Path) -> axum::Router {
    let db = DBService::new_in_memory().await.unwrap();
    let state = AppState::new(db, FileStorage::new(asset_dir), None);
    server::router(state)
}

async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn create_project(app: &axum::Router, name: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/projects",
        Some(json!({ "name": name, "subtype": "template", "needs_figma": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn first_workflow_load_seeds_eleven_steps() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let project_id = create_project(&app, "Relaunch").await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/projects/{project_id}/workflow"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["version"], 1);
    let steps = body["data"]["document"]["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 11);
    assert_eq!(steps[0]["id"], "brief");
    assert_eq!(steps[0]["status"], "pending");

    let labels: Vec<&str> = steps.iter().map(|s| s["label"].as_str().unwrap()).collect();
    assert!(labels.contains(&"7a") && labels.contains(&"7b"));
}

#[tokio::test]
async fn completing_an_unready_step_returns_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let project_id = create_project(&app, "Relaunch").await;

    send(
        &app,
        Method::GET,
        &format!("/api/projects/{project_id}/workflow"),
        None,
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/projects/{project_id}/workflow/steps/brief/complete"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn invoice_totals_are_computed_server_side() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let project_id = create_project(&app, "Relaunch").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/projects/{project_id}/invoices"),
        Some(json!({
            "doc_type": "invoice",
            "number": "INV-001",
            "discount_cents": 10000,
            "tax_rate_bp": 500,
            "items": [
                { "description": "Build", "unit_price_cents": 100000 }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subtotal_cents"], 100000);
    assert_eq!(body["data"]["tax_cents"], 4500);
    assert_eq!(body["data"]["total_cents"], 94500);
}

#[tokio::test]
async fn scope_generation_degrades_to_the_fallback_without_a_key() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let project_id = create_project(&app, "Relaunch").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/generate-scope",
        Some(json!({ "project_id": project_id })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"]["scope"].as_str().unwrap().contains("unavailable"));
    assert_eq!(body["data"]["questions"], json!([]));
}

#[tokio::test]
async fn scope_generation_for_a_missing_project_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let (status, _body) = send(
        &app,
        Method::POST,
        "/api/ai/generate-scope",
        Some(json!({ "project_id": uuid::Uuid::new_v4() })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn step_file_upload_attaches_and_serves() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let project_id = create_project(&app, "Relaunch").await;

    send(
        &app,
        Method::GET,
        &format!("/api/projects/{project_id}/workflow"),
        None,
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/projects/{project_id}/workflow/steps/brief/files"),
        Some(json!({
            "filename": "brief.txt",
            "content_type": "text/plain",
            "data_base64": "aGVsbG8="
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let steps = body["data"]["document"]["steps"].as_array().unwrap();
    let files = steps[0]["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["active"], true);

    let url = files[0]["url"].as_str().unwrap().to_string();
    let (status, _) = send(&app, Method::GET, &url, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn projects_are_archived_not_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let project_id = create_project(&app, "Old build").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/projects/{project_id}/archive"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["archived"], true);

    let (_, listed) = send(&app, Method::GET, "/api/projects", None).await;
    assert!(listed["data"].as_array().unwrap().is_empty());

    let (_, listed) = send(
        &app,
        Method::GET,
        "/api/projects?include_archived=true",
        None,
    )
    .await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}
