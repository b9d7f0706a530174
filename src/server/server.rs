use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::loader::Loader;
use crate::server::{get::get_promotion, upload::upload_promotions};
use crate::store::Store;

/// State shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub loader: Arc<Loader>,
}

impl AppState {
    pub fn new(store: Arc<Store>, loader: Arc<Loader>) -> Self {
        Self { store, loader }
    }
}

/// Create the router with all endpoints
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/promotions", post(upload_promotions))
        .route("/promotions/:id", get(get_promotion))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "records": state.store.len(),
    }))
}

/// HTTP server
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
}

impl Server {
    /// Create and bind the server to the specified address
    pub async fn bind(addr: &str, router: Router) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("HTTP server bound to {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            router,
        })
    }

    /// Get local listening address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve requests until Ctrl-C or SIGTERM
    pub async fn run(self) -> std::io::Result<()> {
        info!("Server started, listening on {}", self.local_addr);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Record;
    use crate::server::upload::UploadResponse;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const KNOWN_ID: &str = "d018ef0b-dbd9-48f1-ac1a-eb4d90e57118";
    const UNKNOWN_ID: &str = "5e0fca24-1111-1111-84a3-7f0813719d19";
    const SOURCE: &str = "d018ef0b-dbd9-48f1-ac1a-eb4d90e57118,9.99,2025-12-31\n";
    const BOUNDARY: &str = "promostore-test-boundary";

    struct TestApp {
        router: Router,
        store: Arc<Store>,
        loader: Arc<Loader>,
        _dir: tempfile::TempDir,
    }

    async fn test_app() -> TestApp {
        test_app_with_limit(1024 * 1024).await
    }

    async fn test_app_with_limit(max_upload_bytes: usize) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("promotions.csv");
        std::fs::write(&path, SOURCE).unwrap();

        let store = Arc::new(Store::new());
        let loader = Arc::new(Loader::new(Arc::clone(&store), path));
        loader.reload().await.unwrap();

        let router = create_router(
            AppState::new(Arc::clone(&store), Arc::clone(&loader)),
            max_upload_bytes,
        );
        TestApp {
            router,
            store,
            loader,
            _dir: dir,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = router.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn upload_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, filename, contents) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match filename {
                Some(filename) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/csv\r\n\r\n",
                    name, filename
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(contents);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        Request::builder()
            .method("POST")
            .uri("/promotions")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn error_message(body: &[u8]) -> String {
        let json: Value = serde_json::from_slice(body).unwrap();
        json["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_get_promotion() {
        let app = test_app().await;

        let (status, body) = send(&app.router, get_request(&format!("/promotions/{}", KNOWN_ID))).await;

        assert_eq!(status, StatusCode::OK);
        let record: Record = serde_json::from_slice(&body).unwrap();
        assert_eq!(record, Record::new(KNOWN_ID, 9.99, "2025-12-31"));
    }

    #[tokio::test]
    async fn test_get_promotion_uppercase_id() {
        let app = test_app().await;

        let uri = format!("/promotions/{}", KNOWN_ID.to_uppercase());
        let (status, _) = send(&app.router, get_request(&uri)).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_nonexistent_promotion() {
        let app = test_app().await;

        let (status, body) =
            send(&app.router, get_request(&format!("/promotions/{}", UNKNOWN_ID))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_message(&body), "Promotion not found");
    }

    #[tokio::test]
    async fn test_get_invalid_id() {
        let app = test_app().await;

        let (status, body) = send(&app.router, get_request("/promotions/not-a-real-id")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_message(&body), "Invalid promotion ID");
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;

        let (status, body) = send(&app.router, get_request("/health")).await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["records"], 1);
    }

    #[tokio::test]
    async fn test_upload_replaces_dataset() {
        let app = test_app().await;
        let contents = format!("{},1.50,2030-01-01\n{},2.50,2031-01-01\n", UNKNOWN_ID, UNKNOWN_ID);

        let (status, body) = send(
            &app.router,
            upload_request(&[
                ("file_name", None, "promotions.csv"),
                ("file", Some("upload.csv"), contents.as_str()),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let resp: UploadResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.message, "File promotions.csv Uploaded successfully");
        assert_eq!(resp.records, 1);

        // the old dataset is gone, first occurrence of the new one wins
        let (status, _) = send(&app.router, get_request(&format!("/promotions/{}", KNOWN_ID))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            send(&app.router, get_request(&format!("/promotions/{}", UNKNOWN_ID))).await;
        assert_eq!(status, StatusCode::OK);
        let record: Record = serde_json::from_slice(&body).unwrap();
        assert_eq!(record.price, 1.5);
        assert_eq!(record.expiration, "2030-01-01");

        assert_eq!(
            std::fs::read_to_string(app.loader.source()).unwrap(),
            contents
        );
    }

    #[tokio::test]
    async fn test_upload_file_name_defaults_to_part_filename() {
        let app = test_app().await;

        let (status, body) = send(
            &app.router,
            upload_request(&[("file", Some("weekly.csv"), SOURCE)]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let resp: UploadResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.message, "File weekly.csv Uploaded successfully");
    }

    #[tokio::test]
    async fn test_upload_malformed_keeps_dataset() {
        let app = test_app().await;

        let (status, body) = send(
            &app.router,
            upload_request(&[("file", Some("bad.csv"), "abc,notanumber,2099-01-01\n")]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error_message(&body).contains("invalid price"));

        assert_eq!(app.store.len(), 1);
        let (status, _) = send(&app.router, get_request(&format!("/promotions/{}", KNOWN_ID))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            std::fs::read_to_string(app.loader.source()).unwrap(),
            SOURCE
        );
    }

    #[tokio::test]
    async fn test_upload_exceeds_limit() {
        let app = test_app_with_limit(64).await;
        let contents = format!("{},1.50,2030-01-01\n", UNKNOWN_ID).repeat(20);

        let (status, body) = send(
            &app.router,
            upload_request(&[("file", Some("big.csv"), contents.as_str())]),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(error_message(&body).starts_with("Invalid upload"));
        assert_eq!(app.store.len(), 1);
        assert!(app.store.get(UNKNOWN_ID).is_none());
        assert_eq!(
            std::fs::read_to_string(app.loader.source()).unwrap(),
            SOURCE
        );
    }

    #[tokio::test]
    async fn test_get_non_finite_price() {
        let app = test_app().await;
        app.store.replace(
            [
                Record::new(KNOWN_ID, f64::NAN, "2025-12-31"),
                Record::new(UNKNOWN_ID, f64::NEG_INFINITY, "2026-01-01"),
            ]
            .into_iter()
            .collect(),
        );

        let (status, body) = send(&app.router, get_request(&format!("/promotions/{}", KNOWN_ID))).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["Price"], "NaN");
        let record: Record = serde_json::from_slice(&body).unwrap();
        assert!(record.price.is_nan());

        let (status, body) =
            send(&app.router, get_request(&format!("/promotions/{}", UNKNOWN_ID))).await;
        assert_eq!(status, StatusCode::OK);
        let record: Record = serde_json::from_slice(&body).unwrap();
        assert_eq!(record.price, f64::NEG_INFINITY);
    }

    #[tokio::test]
    async fn test_upload_missing_file_field() {
        let app = test_app().await;

        let (status, body) = send(
            &app.router,
            upload_request(&[("file_name", None, "promotions.csv")]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_message(&body), "Missing multipart field 'file'");
        assert_eq!(app.store.len(), 1);
    }

    #[tokio::test]
    async fn test_server_bind() {
        let app = test_app().await;
        let server = Server::bind("127.0.0.1:0", app.router).await.unwrap();

        assert!(server.local_addr().ip().is_loopback());
        assert_ne!(server.local_addr().port(), 0);
    }
}
