//! Documentation of a student registration intake service.
//!
//! One form, two sinks. Every accepted submission is written to Redis and then mirrored to a
//! Google Sheet through an Apps Script endpoint.
//!
//!
//!
//! # Request Flow
//! - Browser posts the registration form as JSON to `POST /api/form`
//! - Required fields are checked first, anything missing is a `400` and nothing is written
//! - Payload is turned into a record, schema rules run before the write
//! - Record is stored, a rejected or failed write is a `500`
//! - Raw payload is forwarded to the sheet and awaited, its outcome only flips `savedToGoogleSheets`
//! - `201` with the new record id
//!
//!
//!
//! # Notes
//!
//! ## Awaited Mirror
//! The sheet call happens after the store write and before the response. A slow script slows
//! down the submission, but the client learns whether its row landed in the sheet. Submissions
//! are not deduplicated, the same form posted twice is two records.
//!
//! ## Liveness
//! `GET /` never touches Redis, so the server answers even while the store is unreachable.
//!
//!
//!
//! # Setup
//!
//! Environment.
//! ```sh
//! export GOOGLE_SCRIPT_URL=https://script.google.com/macros/s/<deployment>/exec
//! export REDIS_URL=redis://127.0.0.1:6379
//! export PORT=5000
//! export RUST_LOG=info
//! ```
//!
//! `GOOGLE_SCRIPT_URL` can also be mounted as a secret at `/run/secrets/GOOGLE_SCRIPT_URL`.
//!
//! Run.
//! ```sh
//! cargo run --bin intake
//! ```
//!
//! Submit.
//! ```sh
//! curl -X POST localhost:5000/api/form \
//!   -H 'Content-Type: application/json' \
//!   -d '{"firstName":"Asha","lastName":"Patil","phone":"9876543210","caste":"OBC","agreement":true}'
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod routes;
pub mod sheets;
pub mod state;
pub mod store;
pub mod utils;

use routes::{form_handler, health_handler};
use state::State;

pub fn router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(health_handler))
        .route("/api/form", post(form_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");

    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
