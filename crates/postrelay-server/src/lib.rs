//! Ingestion gateway for the post relay service.
//!
//! Accepts posts over HTTP, records them in the post store and hands
//! website submissions to the delivery worker.
//!
//! # Endpoints
//!
//! - `GET /api/messages` - Stored posts, newest first
//! - `POST /api/upload` - Submit a post
//! - `DELETE /api/delete/{id}` - Delete a stored post
//! - `GET /health` - Store size and delivery counters
//! - anything else - Static client files, when a static directory exists

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use post_store::PostStore;
use postrelay_core::ServerConfig;
use relay_outbox::QueueWorker;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod error;
pub mod health;
pub mod posts;

pub use error::{ServerError, ServerResult};
pub use health::health_handler;
pub use posts::{delete_post, list_messages, upload_post};

/// Upper bound on handling a single request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state, passed to handlers via axum's `State`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: PostStore,
    worker: Arc<QueueWorker>,
}

impl AppState {
    pub fn new(store: PostStore, worker: Arc<QueueWorker>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner { store, worker }),
        }
    }

    pub fn store(&self) -> &PostStore {
        &self.inner.store
    }

    pub fn worker(&self) -> &Arc<QueueWorker> {
        &self.inner.worker
    }
}

/// Builds the axum Router with all endpoints and middleware.
pub fn build_router(app_state: AppState, config: &ServerConfig) -> ServerResult<axum::Router> {
    use axum::routing::{delete, get, post};

    let origin = HeaderValue::from_str(&config.allowed_origin).map_err(|e| {
        ServerError::Config(format!(
            "invalid allowed origin {:?}: {}",
            config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let mut router = axum::Router::new()
        .route("/api/messages", get(list_messages))
        .route("/api/upload", post(upload_post))
        .route("/api/delete/{id}", delete(delete_post))
        .route("/health", get(health_handler))
        .with_state(app_state);

    match &config.static_dir {
        Some(dir) if dir.is_dir() => {
            info!(static_dir = %dir.display(), "Serving static files");
            router = router.fallback_service(ServeDir::new(dir));
        }
        Some(dir) => {
            warn!(static_dir = %dir.display(), "Static directory not found, not serving files");
        }
        None => {}
    }

    Ok(router
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use post_store::Post;
    use relay_outbox::{ChannelSender, DeliveryOutcome, WorkerConfig};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Records relayed post ids; delivers everything.
    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChannelSender for RecordingSender {
        async fn send(&self, post: &Post) -> DeliveryOutcome {
            self.sent.lock().unwrap().push(post.id.clone());
            DeliveryOutcome::Delivered
        }
    }

    impl RecordingSender {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    async fn test_app(max_posts: usize) -> (axum::Router, AppState, Arc<RecordingSender>) {
        let store = PostStore::open_in_memory(max_posts).await.unwrap();
        let sender = Arc::new(RecordingSender::default());
        let worker = QueueWorker::new(
            sender.clone(),
            WorkerConfig {
                max_attempts: 3,
                item_spacing: Duration::from_millis(10),
            },
        );
        let state = AppState::new(store, worker);
        let config = ServerConfig {
            static_dir: None,
            ..Default::default()
        };
        let router = build_router(state.clone(), &config).unwrap();
        (router, state, sender)
    }

    fn upload(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    async fn wait_for_idle(state: &AppState) {
        for _ in 0..200 {
            let status = state.worker().status().await;
            if !status.running && status.pending == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("worker did not go idle");
    }

    #[tokio::test]
    async fn upload_then_list_newest_first() {
        let (app, _state, _sender) = test_app(100).await;

        for (topic, tag) in [("first", "Hack"), ("second", "Education")] {
            let response = app
                .clone()
                .oneshot(upload(json!({
                    "topic": topic,
                    "description": format!("{} body", topic),
                    "tag": tag,
                })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                json_body(response).await,
                json!({"success": true, "message": "Post uploaded successfully"})
            );
        }

        let response = app.oneshot(get("/api/messages")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let posts = json_body(response).await;
        let posts = posts.as_array().unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0]["topic"], "second");
        assert_eq!(posts[0]["message"], "second body");
        assert_eq!(posts[1]["topic"], "first");
        assert_eq!(posts[1]["source"], "discord");
    }

    #[tokio::test]
    async fn upload_rejects_missing_fields() {
        let (app, state, _sender) = test_app(100).await;

        let response = app
            .clone()
            .oneshot(upload(json!({"description": "no tag"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Tag and description/message are required"})
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/upload")
                    .header("content-type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(state.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn only_website_posts_are_relayed() {
        let (app, state, sender) = test_app(100).await;

        for source in [None, Some("discord"), Some("bot"), Some("Website")] {
            let mut body = json!({"description": "from elsewhere", "tag": "Hack"});
            if let Some(source) = source {
                body["source"] = json!(source);
            }
            let response = app.clone().oneshot(upload(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(state.worker().status().await.pending, 0);
        assert!(!state.worker().is_running());

        let response = app
            .clone()
            .oneshot(upload(json!({
                "description": "from the site",
                "tag": "Hack",
                "source": "website",
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        wait_for_idle(&state).await;

        let stored = state.store().list().await.unwrap();
        assert_eq!(stored.len(), 5);
        assert_eq!(sender.sent(), vec![stored[0].id.clone()]);
        assert_eq!(state.worker().status().await.delivered, 1);
    }

    #[tokio::test]
    async fn delete_existing_and_missing() {
        let (app, state, _sender) = test_app(100).await;
        let post = state
            .store()
            .insert(post_store::NewPost::new("Others", "to delete"))
            .await
            .unwrap();

        let delete = |id: &str| {
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/delete/{}", id))
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(delete(&post.id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"success": true, "message": "Post deleted successfully"})
        );

        let response = app.oneshot(delete(&post.id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await, json!({"error": "Post not found"}));
    }

    #[tokio::test]
    async fn store_is_capped() {
        let (app, state, _sender) = test_app(3).await;
        for i in 0..5 {
            let response = app
                .clone()
                .oneshot(upload(json!({"description": format!("p{}", i), "tag": "Others"})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let descriptions: Vec<String> = state
            .store()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.description)
            .collect();
        assert_eq!(descriptions, vec!["p4", "p3", "p2"]);
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let (app, state, _sender) = test_app(100).await;
        state
            .store()
            .insert(post_store::NewPost::new("Hack", "one"))
            .await
            .unwrap();

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({
                "status": "OK",
                "messages": 1,
                "queue": {"pending": 0, "running": false, "delivered": 0, "dropped": 0}
            })
        );
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin() {
        let (app, _state, _sender) = test_app(100).await;
        let origin = ServerConfig::default().allowed_origin;

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/upload")
                    .header("origin", origin.as_str())
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            origin.as_str()
        );
    }

    #[tokio::test]
    async fn static_files_are_served_when_directory_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>board</h1>").unwrap();

        let store = PostStore::open_in_memory(100).await.unwrap();
        let worker = QueueWorker::new(
            Arc::new(RecordingSender::default()),
            WorkerConfig::default(),
        );
        let config = ServerConfig {
            static_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let app = build_router(AppState::new(store, worker), &config).unwrap();

        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<h1>board</h1>");
    }

    #[tokio::test]
    async fn invalid_origin_is_a_config_error() {
        let store = PostStore::open_in_memory(100).await.unwrap();
        let worker = QueueWorker::new(
            Arc::new(RecordingSender::default()),
            WorkerConfig::default(),
        );
        let config = ServerConfig {
            allowed_origin: "bad\norigin".to_string(),
            static_dir: None,
            ..Default::default()
        };

        assert!(matches!(
            build_router(AppState::new(store, worker), &config),
            Err(ServerError::Config(_))
        ));
    }
}
