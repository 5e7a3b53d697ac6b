use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::predict;
use super::state::AppState;
use super::status;
use crate::config::AppConfig;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};
use crate::infrastructure::uploads::UPLOADS_URL_PREFIX;

const PUBLIC_DIR: &str = "public";

/// JSON API mounted under `/api`
pub fn create_api_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/status", get(status::get_status))
        .route(
            "/predict",
            post(predict::predict).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

/// Create the full router: health checks, JSON API, uploaded images and the UI
pub fn create_router(
    state: AppState,
    config: &AppConfig,
    metrics: Option<PrometheusMetrics>,
) -> Router {
    let ui = ServeDir::new(PUBLIC_DIR).fallback(ServeFile::new(format!("{}/index.html", PUBLIC_DIR)));

    let router = Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/api", create_api_router(config.uploads.max_bytes))
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(&config.uploads.dir))
        .fallback_service(ui)
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http());

    match metrics {
        Some(metrics) => router.merge(create_metrics_router(metrics, &config.metrics.path)),
        None => router,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::api::types::LOADING_MESSAGE;
    use crate::domain::predictor::mock::fixed_set;
    use crate::domain::preprocess::tests::solid_png;
    use crate::domain::{ClassList, EnsemblePredictor, Readiness, ReadinessState};
    use crate::infrastructure::UploadStore;

    const BOUNDARY: &str = "leaf-test-boundary";

    fn test_app(readiness: Readiness, uploads: &Path) -> Router {
        let mut config = AppConfig::default();
        config.uploads.dir = uploads.to_path_buf();

        let state = ReadinessState::new();
        if !readiness.is_loading() {
            state.publish(readiness);
        }

        let classes = ClassList::new(config.classes.clone()).unwrap();
        let store = UploadStore::from_config(&config.uploads);
        let app_state = AppState::new(state, EnsemblePredictor::new(classes), store);

        create_router(app_state, &config, None)
    }

    fn ready() -> Readiness {
        Readiness::ready(fixed_set([
            vec![0.1, 0.1, 0.1, 0.7],
            vec![0.6, 0.2, 0.1, 0.1],
            vec![0.05, 0.05, 0.1, 0.8],
        ]))
        .unwrap()
    }

    fn multipart_request(file_name: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/predict")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn upload_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_status_while_loading() {
        let dir = TempDir::new().unwrap();
        let app = test_app(Readiness::Loading, dir.path());

        let response = app
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["state"], "loading");
        assert_eq!(json["loaded"], false);
        assert_eq!(json["classes"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_predict_while_loading() {
        let dir = TempDir::new().unwrap();
        let app = test_app(Readiness::Loading, dir.path());

        let png = solid_png(8, 8, [0, 128, 0]);
        let response = app.oneshot(multipart_request("leaf.png", &png)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = json_body(response).await;
        assert_eq!(json["error"]["message"], LOADING_MESSAGE);
        assert_eq!(json["error"]["code"], "models_loading");
        assert_eq!(upload_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_predict_after_failed_load() {
        let dir = TempDir::new().unwrap();
        let app = test_app(Readiness::failed("vgg: HTTP 404"), dir.path());

        let png = solid_png(8, 8, [0, 128, 0]);
        let response = app.oneshot(multipart_request("leaf.png", &png)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = json_body(response).await;
        assert_eq!(
            json["error"]["message"],
            "Inference is unavailable: vgg: HTTP 404"
        );
    }

    #[tokio::test]
    async fn test_predict_success() {
        let dir = TempDir::new().unwrap();
        let app = test_app(ready(), dir.path());

        let png = solid_png(32, 32, [40, 160, 40]);
        let response = app
            .oneshot(multipart_request("my leaf.png", &png))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["label"], "Healthy");
        assert_eq!(json["confidence"], 53.33);
        assert_eq!(json["probabilities"].as_array().unwrap().len(), 4);

        let url = json["image_url"].as_str().unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with("my_leaf.png"));
        assert_eq!(upload_count(dir.path()), 1);
    }

    #[tokio::test]
    async fn test_predict_undecodable_image_removes_upload() {
        let dir = TempDir::new().unwrap();
        let app = test_app(ready(), dir.path());

        let response = app
            .oneshot(multipart_request("leaf.png", b"not an image"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        let message = json["error"]["message"].as_str().unwrap();
        assert!(message.starts_with("Prediction failed: "));
        assert_eq!(upload_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_predict_rejects_extension() {
        let dir = TempDir::new().unwrap();
        let app = test_app(ready(), dir.path());

        let response = app
            .oneshot(multipart_request("notes.txt", b"hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("File type not allowed"));
    }

    #[tokio::test]
    async fn test_ready_endpoint_follows_readiness() {
        let dir = TempDir::new().unwrap();

        let loading = test_app(Readiness::Loading, dir.path())
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(loading.status(), StatusCode::SERVICE_UNAVAILABLE);

        let ready = test_app(ready(), dir.path())
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ready.status(), StatusCode::OK);

        let live = test_app(Readiness::Loading, dir.path())
            .oneshot(Request::get("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(live.status(), StatusCode::OK);
    }
}
