//! End-to-end tests for the intake router with in-process store and sheet doubles.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use intake::{
    config::Config,
    models::{Caste, RegistrationRecord},
    router,
    sheets::SheetMirror,
    state::State,
    store::{MemoryStore, RegistrationStore, StoreError},
};
use serde_json::{Value, json};
use tower::ServiceExt;

struct FakeSheet {
    acknowledge: bool,
    received: Mutex<Vec<Value>>,
}

impl FakeSheet {
    fn new(acknowledge: bool) -> Arc<Self> {
        Arc::new(Self {
            acknowledge,
            received: Mutex::new(Vec::new()),
        })
    }

    fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl SheetMirror for FakeSheet {
    async fn forward(&self, payload: &Value) -> bool {
        self.received.lock().unwrap().push(payload.clone());
        self.acknowledge
    }
}

struct DownStore;

#[async_trait]
impl RegistrationStore for DownStore {
    async fn insert(&self, _record: &RegistrationRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

fn config() -> Config {
    Config {
        port: 5000,
        redis_url: "redis://127.0.0.1:6379".to_string(),
        sheets_url: Some("http://127.0.0.1:9/exec".to_string()),
    }
}

fn app(store: Arc<dyn RegistrationStore>, sheet: Arc<FakeSheet>) -> Router {
    router(State::with_parts(config(), store, sheet))
}

fn valid_form() -> Value {
    json!({
        "firstName": "Asha",
        "lastName": "Patil",
        "email": "asha@example.com",
        "phone": "9876543210",
        "cetPercentile": "97.4",
        "gradeLevel": "12",
        "caste": "General",
        "agreement": true
    })
}

async fn post_form(app: &Router, body: Body) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/form")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();

    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(app: &Router, payload: &Value) -> (StatusCode, Value) {
    post_form(app, Body::from(serde_json::to_vec(payload).unwrap())).await
}

#[tokio::test]
async fn test_liveness() {
    let app = app(Arc::new(DownStore), FakeSheet::new(true));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"Backend is up and running!");
}

#[tokio::test]
async fn test_valid_submission() {
    let store = MemoryStore::new();
    let sheet = FakeSheet::new(true);
    let app = app(Arc::new(store.clone()), sheet.clone());

    let before = Utc::now();
    let (status, body) = post_json(&app, &valid_form()).await;
    let after = Utc::now();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Form submitted successfully");
    assert_eq!(body["savedToMongoDB"], true);
    assert_eq!(body["savedToGoogleSheets"], true);

    let records = store.records();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(body["id"], record.id.as_str());
    assert_eq!(record.role, "Student");
    assert_eq!(record.caste, Caste::General);
    assert!(record.agreement);
    assert!(record.created_at >= before && record.created_at <= after);

    assert_eq!(sheet.received(), vec![valid_form()]);
}

#[tokio::test]
async fn test_every_caste_accepted() {
    for caste in ["General", "OBC", "SC/ST", "Others"] {
        let store = MemoryStore::new();
        let app = app(Arc::new(store.clone()), FakeSheet::new(true));

        let mut form = valid_form();
        form["caste"] = json!(caste);

        let (status, _) = post_json(&app, &form).await;

        assert_eq!(status, StatusCode::CREATED, "caste {caste}");
        assert_eq!(store.records()[0].caste.as_str(), caste);
    }
}

#[tokio::test]
async fn test_missing_fields() {
    let store = MemoryStore::new();
    let sheet = FakeSheet::new(true);
    let app = app(Arc::new(store.clone()), sheet.clone());

    let (status, body) = post_json(&app, &json!({"lastName": "Patil", "agreement": true})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing fields: firstName, phone, caste"}));
    assert!(store.records().is_empty());
    assert!(sheet.received().is_empty());
}

#[tokio::test]
async fn test_empty_strings_are_missing() {
    let store = MemoryStore::new();
    let app = app(Arc::new(store.clone()), FakeSheet::new(true));

    let mut form = valid_form();
    form["firstName"] = json!("");
    form["caste"] = json!("");

    let (status, body) = post_json(&app, &form).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing fields: firstName, caste");
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn test_unknown_caste_is_server_error() {
    let store = MemoryStore::new();
    let sheet = FakeSheet::new(true);
    let app = app(Arc::new(store.clone()), sheet.clone());

    let mut form = valid_form();
    form["caste"] = json!("Unlisted");

    let (status, body) = post_json(&app, &form).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("caste"));
    assert!(store.records().is_empty());
    assert!(sheet.received().is_empty());
}

#[tokio::test]
async fn test_agreement_required() {
    let store = MemoryStore::new();
    let app = app(Arc::new(store.clone()), FakeSheet::new(true));

    let mut declined = valid_form();
    declined["agreement"] = json!(false);
    let (status, body) = post_json(&app, &declined).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("agreement"));

    let mut absent = valid_form();
    absent.as_object_mut().unwrap().remove("agreement");
    let (status, body) = post_json(&app, &absent).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);

    assert!(store.records().is_empty());
}

#[tokio::test]
async fn test_agreement_casting() {
    let store = MemoryStore::new();
    let app = app(Arc::new(store.clone()), FakeSheet::new(true));

    let mut numeric = valid_form();
    numeric["agreement"] = json!(1);
    let (status, body) = post_json(&app, &numeric).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    let mut declined = valid_form();
    declined["agreement"] = json!("no");
    let (status, body) = post_json(&app, &declined).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);

    assert_eq!(store.records().len(), 1);
    assert!(store.records()[0].agreement);
}

#[tokio::test]
async fn test_sheet_failure_keeps_record() {
    let store = MemoryStore::new();
    let sheet = FakeSheet::new(false);
    let app = app(Arc::new(store.clone()), sheet.clone());

    let (status, body) = post_json(&app, &valid_form()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["savedToGoogleSheets"], false);
    assert_eq!(store.records().len(), 1);
    assert_eq!(sheet.received().len(), 1);
}

#[tokio::test]
async fn test_store_failure() {
    let sheet = FakeSheet::new(true);
    let app = app(Arc::new(DownStore), sheet.clone());

    let (status, body) = post_json(&app, &valid_form()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"success": false, "error": "Store unavailable: connection refused"})
    );
    assert!(sheet.received().is_empty());
}

#[tokio::test]
async fn test_duplicate_submissions_create_two_records() {
    let store = MemoryStore::new();
    let app = app(Arc::new(store.clone()), FakeSheet::new(true));

    let (_, first) = post_json(&app, &valid_form()).await;
    let (_, second) = post_json(&app, &valid_form()).await;

    assert_ne!(first["id"], second["id"]);
    assert_eq!(store.records().len(), 2);
}

#[tokio::test]
async fn test_malformed_json() {
    let store = MemoryStore::new();
    let app = app(Arc::new(store.clone()), FakeSheet::new(true));

    let (status, body) = post_form(&app, Body::from("{\"firstName\": ")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn test_non_json_body_reports_missing_fields() {
    let store = MemoryStore::new();
    let sheet = FakeSheet::new(true);
    let app = app(Arc::new(store.clone()), sheet.clone());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/form")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(serde_json::to_vec(&valid_form()).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Missing fields: firstName, lastName, phone, caste"})
    );
    assert!(store.records().is_empty());
    assert!(sheet.received().is_empty());
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = app(Arc::new(MemoryStore::new()), FakeSheet::new(true));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/form")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
