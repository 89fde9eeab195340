//! End-to-end tests for the HTTP API.
//!
//! The router runs against a real sled store and uploads directory in a temp
//! dir; embeddings and the LLM are replaced by deterministic stand-ins.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use inkmatch::application::services::{
    CatalogService, EmbeddingEngine, IdeaGenerator, ServiceConfig, SimilarityRanker,
    StudioService,
};
use inkmatch::domain::DomainError;
use inkmatch::infrastructure::{SledCatalogStore, SvgPlaceholderRenderer, UploadDirectory};
use inkmatch::interfaces::{router, AppState};
use inkmatch::settings::ServerSettings;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "inkmatch-test-boundary";

/// One dimension per theme word; a text scores by which themes it mentions.
struct ThemeEngine;

const THEMES: [&str; 4] = ["dragon", "rose", "wolf", "mountain"];

impl EmbeddingEngine for ThemeEngine {
    fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let lower = text.to_lowercase();
        Ok(THEMES
            .iter()
            .map(|theme| if lower.contains(theme) { 1.0 } else { 0.0 })
            .collect())
    }

    fn dims(&self) -> Option<usize> {
        Some(THEMES.len())
    }

    fn model_name(&self) -> &str {
        "test/themes"
    }
}

struct CannedIdeas;

impl IdeaGenerator for CannedIdeas {
    fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        assert!(prompt.contains("Tattoo Idea:"));
        Ok("  A lone wolf beneath a crescent moon.  ".into())
    }
}

struct Harness {
    app: Router,
    _dir: TempDir,
}

fn harness(top_k: usize) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = SledCatalogStore::open(dir.path().join("store")).unwrap();
    let uploads = UploadDirectory::open(dir.path().join("uploads")).unwrap();

    let catalog = Arc::new(CatalogService::new(
        Arc::new(store),
        Arc::new(uploads),
        SimilarityRanker::new(Arc::new(ThemeEngine)),
        ServiceConfig::new(top_k),
    ));
    let studio = Arc::new(StudioService::new(
        Arc::new(CannedIdeas),
        Arc::new(SvgPlaceholderRenderer::new()),
    ));

    let app = router(AppState { catalog, studio }, &ServerSettings::default()).unwrap();
    Harness { app, _dir: dir }
}

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    payload: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match payload {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let (status, body) = send(app, request).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

async fn upload(
    app: &Router,
    name: &str,
    description: &str,
    file_name: &str,
) -> (StatusCode, Value) {
    let image: &[u8] = b"\x89PNG fake image bytes";
    let body = multipart_body(
        &[("name", name), ("description", description)],
        Some((file_name, image)),
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tattoos/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn seed_dragon_catalog(app: &Router) {
    for (name, description, file) in [
        ("A", "dragon on a mountain", "a.png"),
        ("B", "rose with thorns", "b.png"),
        ("C", "dragon flying over the sea", "c.png"),
    ] {
        let (status, _) = upload(app, name, description, file).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn health_reports_empty_catalog() {
    let h = harness(3);
    let (status, body) = send_json(&h.app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"], "test/themes");
    assert_eq!(body["tattoos"], 0);
}

#[tokio::test]
async fn upload_then_list_get_and_serve_image() {
    let h = harness(3);

    let (status, created) = upload(&h.app, "Koi", "koi fish in waves", "koi.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["name"], "Koi");
    assert_eq!(created["description"], "koi fish in waves");
    assert_eq!(created["image"], "koi.png");
    let id = created["id"].as_u64().unwrap();

    let (status, listed) = send_json(&h.app, Method::GET, "/tattoos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created.clone()]));

    let (status, fetched) = send_json(&h.app, Method::GET, &format!("/tattoos/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, bytes) = send(
        &h.app,
        Request::builder()
            .uri("/uploads/koi.png")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"\x89PNG fake image bytes");
}

#[tokio::test]
async fn upload_strips_directories_from_file_name() {
    let h = harness(3);
    let (status, created) = upload(&h.app, "Owl", "night owl", "../../owl.png").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["image"], "owl.png");
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let h = harness(3);
    let body = multipart_body(&[("name", "Koi"), ("description", "koi fish")], None);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tattoos/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&h.app, request).await;
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn unknown_tattoo_is_not_found() {
    let h = harness(3);
    let (status, body) = send_json(&h.app, Method::GET, "/tattoos/4242", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn recommend_ranks_dragons_above_rose_and_rewrites_images() {
    let h = harness(2);
    seed_dragon_catalog(&h.app).await;

    let (status, body) = send_json(
        &h.app,
        Method::POST,
        "/recommend",
        Some(json!({ "user_input": "a fierce dragon" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["name"], "C");
    assert_eq!(results[1]["name"], "A");
    assert_eq!(results[0]["image"], "/uploads/c.png");
    assert_eq!(results[1]["image"], "/uploads/a.png");
    assert!(results[0].get("score").is_none());
}

#[tokio::test]
async fn recommend_accepts_explicit_top_k() {
    let h = harness(1);
    seed_dragon_catalog(&h.app).await;

    let (status, body) = send_json(
        &h.app,
        Method::POST,
        "/recommend",
        Some(json!({ "user_input": "rose on a mountain", "top_k": 10 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 3);
    assert_eq!(names[2], "C");
}

#[tokio::test]
async fn recommend_on_empty_catalog_returns_empty_list() {
    let h = harness(3);
    let (status, body) = send_json(
        &h.app,
        Method::POST,
        "/recommend",
        Some(json!({ "user_input": "anything" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn recommend_without_user_input_uses_empty_query() {
    let h = harness(3);
    seed_dragon_catalog(&h.app).await;

    let (status, body) = send_json(&h.app, Method::POST, "/recommend", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn recommend_rejects_non_string_query() {
    let h = harness(3);
    let (status, body) = send_json(
        &h.app,
        Method::POST,
        "/recommend",
        Some(json!({ "user_input": 42 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUERY");
}

#[tokio::test]
async fn llm_idea_returns_trimmed_idea() {
    let h = harness(3);
    let (status, body) = send_json(
        &h.app,
        Method::POST,
        "/llm_idea",
        Some(json!({ "user_input": "quiet night walker" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["idea"], "A lone wolf beneath a crescent moon.");
}

#[tokio::test]
async fn generative_endpoints_require_user_input() {
    let h = harness(3);
    for uri in ["/llm_idea", "/generate_image", "/generate_image_local"] {
        let (status, body) =
            send_json(&h.app, Method::POST, uri, Some(json!({ "user_input": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "VALIDATION_FAILED", "{uri}");
    }
}

#[tokio::test]
async fn generate_image_returns_prompt_for_external_service() {
    let h = harness(3);
    let (status, body) = send_json(
        &h.app,
        Method::POST,
        "/generate_image",
        Some(json!({ "user_input": "koi fish" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["prompt"],
        "tattoo design, koi fish, black and white, detailed line art, minimalist, clean design"
    );
    assert!(body["message"].as_str().unwrap().contains("Stability AI"));
}

#[tokio::test]
async fn generate_image_local_returns_svg_data_url() {
    let h = harness(3);
    let (status, body) = send_json(
        &h.app,
        Method::POST,
        "/generate_image_local",
        Some(json!({ "user_input": "koi fish" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/svg+xml;base64,"));
}

#[tokio::test]
async fn cors_preflight_allows_frontend_origin() {
    let h = harness(3);
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/recommend")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}
