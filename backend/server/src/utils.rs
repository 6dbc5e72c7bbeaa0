use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};
use ulid::Ulid;

use crate::{
    error::AppError,
    models::{RegistrationForm, RegistrationRecord, SubmissionReceipt, missing_fields},
    state::State,
    store::StoreError,
};

pub fn check_required(payload: &Value) -> Result<(), AppError> {
    let missing = missing_fields(payload);

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::MissingFields(missing))
    }
}

pub fn build_record(
    payload: &Value,
    created_at: DateTime<Utc>,
) -> Result<RegistrationRecord, StoreError> {
    let form: RegistrationForm = serde_json::from_value(payload.clone())?;

    Ok(RegistrationRecord::from_form(
        form,
        Ulid::new().to_string(),
        created_at,
    )?)
}

/// Validates, stores, then mirrors one submission. The mirror outcome never fails the call.
pub async fn submit(state: &State, payload: Value) -> Result<SubmissionReceipt, AppError> {
    check_required(&payload)?;

    let record = build_record(&payload, Utc::now())?;
    state.store.insert(&record).await?;

    info!("Saved registration {}", record.id);

    let saved_to_sheets = state.mirror.forward(&payload).await;
    if !saved_to_sheets {
        warn!("Registration {} was not mirrored to Google Sheets", record.id);
    }

    Ok(SubmissionReceipt::new(record.id, saved_to_sheets))
}
