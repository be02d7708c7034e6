//! # HTTP API
//!
//! Builds the axum router for the wallet RPC server. Handlers never touch
//! the wallet: they decode the envelope and forward it to the worker.
//!
//! ## Endpoints
//!
//! | Method | Path        | Description           |
//! |--------|-------------|-----------------------|
//! | GET    | `/health`   | Liveness check        |
//! | POST   | `/json_rpc` | JSON-RPC 2.0 gateway  |

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use solace_wallet::rpc::{JsonRpcRequest, JsonRpcResponse, WalletRpcError};

use crate::worker::WorkerHandle;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Reported server version.
    pub version: String,
    /// "mainnet" or "testnet".
    pub network: String,
    pub worker: WorkerHandle,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub network: String,
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the axum [`Router`] with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/json_rpc", post(json_rpc_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: 200 while the process is up.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
            version: state.version.clone(),
            network: state.network.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }),
    )
}

/// `POST /json_rpc`: JSON-RPC 2.0 gateway.
///
/// Malformed JSON answers -32700 and a body that is not an envelope answers
/// -32600, both with HTTP 200 like every other JSON-RPC error.
async fn json_rpc_handler(State(state): State<AppState>, body: Bytes) -> Json<JsonRpcResponse> {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return Json(JsonRpcResponse::failure(
                Value::Null,
                WalletRpcError::Parse(e.to_string()).to_json_error(),
            ));
        }
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return Json(JsonRpcResponse::failure(
                id,
                WalletRpcError::InvalidRequest(e.to_string()).to_json_error(),
            ));
        }
    };

    match state.worker.call(request).await {
        Some(response) => Json(response),
        None => {
            tracing::error!("wallet worker is gone");
            Json(JsonRpcResponse::failure(
                id,
                WalletRpcError::Unknown("wallet worker is not running".into()).to_json_error(),
            ))
        }
    }
}
