//! HTTP surface.
//!
//! Endpoints:
//! - POST /v1/immurestproxy/item/safe: verifiable write
//! - GET  /v1/immurestproxy/root:      current trust anchor
//! - GET  /healthz:                    liveness

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::error::GatewayError;
use crate::handlers::{RootResponse, SafeSetHandler, SafeSetResponse};

pub const SAFE_SET_PATH: &str = "/v1/immurestproxy/item/safe";
pub const ROOT_PATH: &str = "/v1/immurestproxy/root";

pub fn router(handler: Arc<SafeSetHandler>) -> Router {
    Router::new()
        .route(SAFE_SET_PATH, post(safe_set))
        .route(ROOT_PATH, get(current_root))
        .route("/healthz", get(health))
        .fallback(unknown_endpoint)
        .with_state(handler)
}

// Raw bytes, not `Json<_>`: body errors must carry the codec's messages.
async fn safe_set(
    State(handler): State<Arc<SafeSetHandler>>,
    body: Bytes,
) -> Result<Json<SafeSetResponse>, GatewayError> {
    handler.safe_set(&body).await.map(Json)
}

async fn current_root(State(handler): State<Arc<SafeSetHandler>>) -> Json<RootResponse> {
    Json(handler.current_root())
}

async fn health() -> &'static str {
    "ok"
}

async fn unknown_endpoint(method: Method, uri: Uri) -> GatewayError {
    GatewayError::UnknownEndpoint {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

/// Serve `router` on `listener` until Ctrl+C or SIGTERM.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use immurest_core::TrustAnchor;
    use tower::ServiceExt;

    fn app() -> Router {
        let handler = SafeSetHandler::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(TrustAnchor::default()),
        );
        router(Arc::new(handler))
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn safe_set_only_accepts_post() {
        let request = Request::builder()
            .method("GET")
            .uri(SAFE_SET_PATH)
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
