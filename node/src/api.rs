//! # REST API
//!
//! Builds the axum router that exposes the registry node's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                             | Description                       |
//! |--------|----------------------------------|-----------------------------------|
//! | GET    | `/health`                        | Liveness probe                    |
//! | GET    | `/status`                        | Node status summary               |
//! | POST   | `/transitions`                   | Submit a signed transition        |
//! | GET    | `/network`                       | Network configuration singleton   |
//! | GET    | `/identities/:owner`             | Identity by owner key (hex)       |
//! | GET    | `/identities/by-address/:address`| Identity by address (bech32)      |
//! | GET    | `/assets/:address`               | Asset by address (bech32)         |
//! | GET    | `/authorities/:authority/assets` | Assets in an authority namespace  |
//!
//! Registry errors map onto HTTP statuses the obvious way: conflicts on
//! occupied addresses are 409, authorization failures are 403, missing
//! records are 404, and rejected inputs are 422. The body is always an
//! [`ErrorResponse`] naming the failure.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crest_registry::{Address, PublicKey, Registry, RegistryError, SignedTransition};

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`. The `RwLock` is the node's
/// serialization point: `apply` takes the write lock, so no two
/// transitions ever interleave on the store.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The registry state machine.
    pub registry: Arc<RwLock<Registry>>,
}

impl AppState {
    /// Fresh state over an empty registry.
    pub fn new(version: String) -> Self {
        Self {
            version,
            registry: Arc::new(RwLock::new(Registry::new())),
        }
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured RPC port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/transitions", post(submit_transition_handler))
        .route("/network", get(network_handler))
        .route("/identities/:owner", get(identity_handler))
        .route("/identities/by-address/:address", get(identity_by_address_handler))
        .route("/assets/:address", get(asset_handler))
        .route("/authorities/:authority/assets", get(authority_assets_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Number of records in the registry.
    pub record_count: usize,
    /// Hex-encoded state root over all records.
    pub root_hash: String,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Generic error body returned by all endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps a registry error to the HTTP status it should surface as.
fn status_for(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::AlreadyInitialized | RegistryError::AlreadyExists(_) => {
            StatusCode::CONFLICT
        }
        RegistryError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        RegistryError::NotFound(_) | RegistryError::GuardianNotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::MalformedInput { .. }
        | RegistryError::DuplicateGuardian(_)
        | RegistryError::GuardianLimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RegistryError::AddressSearchExhausted | RegistryError::Codec { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_body(err: &RegistryError) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: err.to_string(),
    })
}

fn bad_param(field: &str, detail: impl std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            error: format!("invalid {}: {}", field, detail),
        }),
    )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators (k8s, systemd, etc.).
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns node status summary, including the current
/// state root so two nodes can compare registries in one request.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    let resp = StatusResponse {
        version: state.version.clone(),
        record_count: registry.record_count(),
        root_hash: hex::encode(registry.root_hash()),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `POST /transitions` — verify and apply a signed transition.
///
/// The body is a JSON [`SignedTransition`]. On success the response is
/// the receipt: the affected address, plus the allocated nonce for asset
/// creation.
async fn submit_transition_handler(
    State(state): State<AppState>,
    Json(signed): Json<SignedTransition>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;
    match registry.apply(&signed) {
        Ok(receipt) => (StatusCode::OK, Json(serde_json::json!(receipt))).into_response(),
        Err(err) => {
            tracing::debug!(signer = %signed.signer, error = %err, "transition rejected");
            (status_for(&err), error_body(&err)).into_response()
        }
    }
}

/// `GET /network` — returns the network configuration singleton.
///
/// 404 until `initialize_network` has been applied.
async fn network_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.network() {
        Ok(Some(config)) => (StatusCode::OK, Json(serde_json::json!(config))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "network is not initialized".into(),
            }),
        )
            .into_response(),
        Err(err) => (status_for(&err), error_body(&err)).into_response(),
    }
}

/// `GET /identities/:owner` — returns the identity owned by a key.
///
/// The owner is the hex-encoded Ed25519 public key whose derived address
/// the identity lives at.
async fn identity_handler(
    Path(owner): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let owner = match PublicKey::from_hex(&owner) {
        Ok(key) => key,
        Err(err) => return bad_param("owner key", err).into_response(),
    };

    let registry = state.registry.read().await;
    match registry.identity(&owner) {
        Ok(Some(identity)) => (StatusCode::OK, Json(serde_json::json!(identity))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no identity for owner {}", owner),
            }),
        )
            .into_response(),
        Err(err) => (status_for(&err), error_body(&err)).into_response(),
    }
}

/// `GET /identities/by-address/:address` — returns the identity at a
/// bech32 address.
///
/// This is the guardian's read path: after a recovery the record still
/// lives at the *old* owner's derived address, which the new owner knows
/// by address rather than by key.
async fn identity_by_address_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let address = match Address::from_bech32(&address) {
        Ok(addr) => addr,
        Err(err) => return bad_param("identity address", err).into_response(),
    };

    let registry = state.registry.read().await;
    match registry.identity_at(&address) {
        Ok(Some(identity)) => (StatusCode::OK, Json(serde_json::json!(identity))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no identity at {}", address),
            }),
        )
            .into_response(),
        Err(err) => (status_for(&err), error_body(&err)).into_response(),
    }
}

/// `GET /assets/:address` — returns the asset at a bech32 address.
async fn asset_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let address = match Address::from_bech32(&address) {
        Ok(addr) => addr,
        Err(err) => return bad_param("asset address", err).into_response(),
    };

    let registry = state.registry.read().await;
    match registry.asset(&address) {
        Ok(Some(asset)) => (StatusCode::OK, Json(serde_json::json!(asset))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no asset at {}", address),
            }),
        )
            .into_response(),
        Err(err) => (status_for(&err), error_body(&err)).into_response(),
    }
}

/// `GET /authorities/:authority/assets` — all assets in an authority's
/// namespace, sorted by nonce. An authority with no assets gets an empty
/// list, not a 404 — the namespace always exists.
async fn authority_assets_handler(
    Path(authority): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let authority = match PublicKey::from_hex(&authority) {
        Ok(key) => key,
        Err(err) => return bad_param("authority key", err).into_response(),
    };

    let registry = state.registry.read().await;
    match registry.assets_by_authority(&authority) {
        Ok(assets) => (StatusCode::OK, Json(serde_json::json!(assets))).into_response(),
        Err(err) => (status_for(&err), error_body(&err)).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
