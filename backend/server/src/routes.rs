use std::sync::Arc;

use axum::{
    Json,
    extract::{self, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::{error::AppError, state::State, utils::submit};

pub const LIVENESS_MESSAGE: &str = "Backend is up and running!";

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, LIVENESS_MESSAGE)
}

pub async fn form_handler(
    extract::State(state): extract::State<Arc<State>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        // Non-JSON bodies are treated as an empty form.
        Err(JsonRejection::MissingJsonContentType(_)) => Value::Object(Map::new()),
        Err(e) => {
            warn!("Rejected form body: {e}");
            return Err(AppError::MalformedPayload(e.body_text()));
        }
    };

    match submit(&state, payload).await {
        Ok(receipt) => Ok((StatusCode::CREATED, Json(receipt))),
        Err(e @ AppError::Persistence(_)) => {
            error!("Server error: {e}");
            Err(e)
        }
        Err(e) => {
            warn!("{e}");
            Err(e)
        }
    }
}
