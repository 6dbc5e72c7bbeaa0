//! # Google Sheets
//!
//! Mirrors each accepted submission into a spreadsheet through an Apps Script web app.
//!
//! ## Proxy
//! The raw request body is forwarded as JSON, untouched, so the script sees exactly what the
//! browser sent. The script answers with plain text, anything containing `Success` counts as
//! a mirrored row.
//!
//! Failures never reach the client as an error status. Transport errors, non-2xx statuses and
//! unreadable bodies are logged and reported as `false`. No retries and no client timeout.
//! Without a configured script URL every submission is reported as not mirrored.
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{error, info, warn};

pub const SUCCESS_MARKER: &str = "Success";

#[async_trait]
pub trait SheetMirror: Send + Sync + 'static {
    /// Returns whether the spreadsheet acknowledged the row.
    async fn forward(&self, payload: &Value) -> bool;
}

pub struct SheetsClient {
    client: Client,
    url: Option<String>,
}

impl SheetsClient {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }

    async fn post(&self, url: &str, payload: &Value) -> Result<String, reqwest::Error> {
        self.client
            .post(url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl SheetMirror for SheetsClient {
    async fn forward(&self, payload: &Value) -> bool {
        let Some(url) = self.url.as_deref() else {
            warn!("Google Sheets URL not configured, skipping mirror");
            return false;
        };

        match self.post(url, payload).await {
            Ok(body) => {
                info!("Google Sheets response: {body}");
                body.contains(SUCCESS_MARKER)
            }
            Err(e) => {
                error!("Google Sheets error: {e}");
                false
            }
        }
    }
}
