//! Router tests against a mock classifier and an in-memory store

use std::io::Cursor;
use std::sync::Arc;

use api::{create_router, AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use image::{ImageFormat, Rgb, RgbImage};
use inference_engine::{InferenceEngine, LabelMap};
use serde_json::{json, Value};
use storage::{Document, DocumentStore, FieldValue, MemoryStore, StorageError};
use tower::ServiceExt;

const BOUNDARY: &str = "cropai-test-boundary";
const UPLOAD_LIMIT: usize = 5 * 1024 * 1024;

fn labels() -> LabelMap {
    [
        (0, "Tomato___Bacterial_spot"),
        (1, "Tomato___Early_blight"),
        (2, "Tomato___Late_blight"),
        (3, "Tomato___healthy"),
    ]
    .into_iter()
    .collect()
}

fn app_with(engine: InferenceEngine, store: Arc<dyn DocumentStore>) -> Router {
    let state = Arc::new(AppState::new(engine, store, "model_submissions"));
    create_router(state, UPLOAD_LIMIT)
}

fn app(store: Arc<MemoryStore>) -> Router {
    app_with(InferenceEngine::mock(vec![0.1, 0.6, 0.25, 0.05], labels()), store)
}

fn leaf_png() -> Vec<u8> {
    let image = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 3) as u8, 140, (y * 5) as u8]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn multipart(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn submission(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/submit_model/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_root_is_static() {
    let app = app(Arc::new(MemoryStore::new()));

    let (status, first) = send(app.clone(), get("/")).await;
    let (_, second) = send(app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        first,
        json!({ "message": "Welcome to CropAI Backend. Use /predict to get disease predictions." })
    );
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_predict_returns_top_three() {
    let app = app(Arc::new(MemoryStore::new()));

    let (status, body) = send(app, multipart("file", "leaf.PNG", &leaf_png())).await;

    assert_eq!(status, StatusCode::OK);
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 3);
    assert_eq!(predictions[0]["label"], "Tomato___Early_blight");
    assert_eq!(predictions[1]["label"], "Tomato___Late_blight");
    assert_eq!(predictions[2]["label"], "Tomato___Bacterial_spot");

    let confidences: Vec<f64> = predictions
        .iter()
        .map(|p| p["confidence"].as_f64().unwrap())
        .collect();
    assert!(confidences.iter().all(|c| (0.0..=1.0).contains(c)));
    assert!(confidences.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_predict_rejects_extension_regardless_of_content() {
    for filename in ["leaf.gif", "leaf.bmp", "leaf", "leaf.png.txt"] {
        let app = app(Arc::new(MemoryStore::new()));
        let (status, body) = send(app, multipart("file", filename, &leaf_png())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{filename}");
        assert_eq!(body["detail"], "Invalid file type. Upload a JPG or PNG image.");
    }
}

#[tokio::test]
async fn test_predict_non_image_bytes() {
    let app = app(Arc::new(MemoryStore::new()));

    let (status, body) = send(app, multipart("file", "leaf.jpg", b"this is not a jpeg")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Prediction failed: "));
}

#[tokio::test]
async fn test_predict_upload_over_limit() {
    let app = app(Arc::new(MemoryStore::new()));
    let oversized = vec![0xFFu8; UPLOAD_LIMIT + 1024 * 1024];

    let (status, body) = send(app, multipart("file", "leaf.jpg", &oversized)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Prediction failed: "));
}

#[tokio::test]
async fn test_predict_missing_file_field() {
    let app = app(Arc::new(MemoryStore::new()));

    let (status, body) = send(app, multipart("image", "leaf.jpg", &leaf_png())).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "Missing upload field 'file'");
}

#[tokio::test]
async fn test_predict_unknown_label() {
    let engine = InferenceEngine::mock(vec![0.1, 0.2, 0.3, 0.4, 0.9], labels());
    let app = app_with(engine, Arc::new(MemoryStore::new()));

    let (status, body) = send(app, multipart("file", "leaf.jpeg", &leaf_png())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"][0]["label"], "unknown");
    assert_eq!(body["predictions"][1]["label"], "Tomato___healthy");
}

#[tokio::test]
async fn test_submit_model_persists_record() {
    let store = Arc::new(MemoryStore::new());
    let app = app(store.clone());

    let (status, body) = send(
        app,
        submission(json!({
            "name": "MobileNetV2 Maize",
            "crop_type": "Maize",
            "accuracy": 0.94,
            "github_url": "https://github.com/example/maize-mobilenet"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Model metadata submitted successfully!" }));

    let docs = store.documents("model_submissions").unwrap();
    assert_eq!(docs.len(), 1);
    let fields = &docs[0].fields;
    assert_eq!(fields["name"], FieldValue::from("MobileNetV2 Maize"));
    assert_eq!(fields["crop_type"], FieldValue::from("Maize"));
    assert_eq!(fields["accuracy"], FieldValue::Double(0.94));
    assert_eq!(fields["description"], FieldValue::Null);
    assert_eq!(
        fields["github_url"],
        FieldValue::from("https://github.com/example/maize-mobilenet")
    );

    let submitted_at = fields["submitted_at"].as_str().unwrap();
    assert!(submitted_at.parse::<chrono::NaiveDateTime>().is_ok());
    assert!(!submitted_at.ends_with('Z'));
}

struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn create_document(&self, _collection: &str, _fields: Document) -> Result<String, StorageError> {
        Err(StorageError::Backend {
            status: 503,
            body: "UNAVAILABLE".to_string(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

#[tokio::test]
async fn test_submit_model_store_failure() {
    let engine = InferenceEngine::mock(vec![1.0], labels());
    let app = app_with(engine, Arc::new(FailingStore));

    let (status, body) = send(
        app,
        submission(json!({ "name": "m", "crop_type": "Rice", "accuracy": 0.5 })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["detail"],
        "Submission failed: Document store returned 503: UNAVAILABLE"
    );
}

#[tokio::test]
async fn test_submit_model_rejects_missing_fields() {
    let store = Arc::new(MemoryStore::new());
    let app = app(store.clone());

    let response = app
        .oneshot(submission(json!({ "name": "m", "accuracy": 0.5 })))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert_eq!(store.document_count("model_submissions"), 0);
}

#[tokio::test]
async fn test_health() {
    let app = app(Arc::new(MemoryStore::new()));

    let (status, body) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["labels"], 4);
    assert_eq!(body["store"], "memory");
}
