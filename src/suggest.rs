//! Exposure suggestion client.
//!
//! When a render classifies as anything other than `ok`, the simulator asks a
//! backend service for human-readable correction advice. The backend is a
//! black box with two endpoints:
//!
//! | Endpoint | Request | Response |
//! |---|---|---|
//! | `GET /api/config` | (none) | `{"has_deepseek_key": bool}` |
//! | `POST /api/check-exposure` | [`SuggestionRequest`] | [`SuggestionResponse`] |
//!
//! The config endpoint is asked once per client and gates every suggestion
//! request; if it cannot be reached the client stays silent.
//!
//! ## Failure handling
//!
//! Suggestions are advisory. Transport errors and malformed JSON are logged
//! and swallowed, never retried, and never affect the rendered image. The
//! backend answers rate limiting with HTTP 429 and a JSON body, so error
//! statuses are still decoded when their body parses.
//!
//! ## Staleness
//!
//! Requests are not cancelled when the parameters change. Each [`Alert`]
//! carries the parameters it was requested for, and callers decide what to do
//! with one that no longer matches the current settings.

use crate::camera::{APERTURE_STOPS, CameraParameters, ISO_STOPS, SHUTTER_STOPS};
use crate::imaging::{ExposureClassification, ExposureStatus};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_PATH: &str = "/api/config";
const CHECK_EXPOSURE_PATH: &str = "/api/check-exposure";
const RATE_LIMIT_STATUS: &str = "rate_limit";

#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("Request failed: {0}")]
    Http(#[from] Box<ureq::Error>),
    #[error("Malformed response: {0}")]
    Malformed(#[from] std::io::Error),
    #[error("Backend returned HTTP {0}")]
    Status(u16),
}

/// Body of `POST /api/check-exposure`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionRequest {
    pub aperture: f64,
    pub shutter: &'static str,
    pub iso: u32,
    /// Average luminance of the rendered frame.
    pub brightness: f64,
    pub status: ExposureStatus,
    pub aperture_options: &'static [f64],
    pub shutter_options: &'static [&'static str],
    pub iso_options: &'static [u32],
}

impl SuggestionRequest {
    pub fn new(params: &CameraParameters, classification: &ExposureClassification) -> Self {
        Self {
            aperture: params.aperture(),
            shutter: params.shutter(),
            iso: params.iso(),
            brightness: classification.average_luminance,
            status: classification.status,
            aperture_options: APERTURE_STOPS,
            shutter_options: SHUTTER_STOPS,
            iso_options: ISO_STOPS,
        }
    }
}

/// Reply from `POST /api/check-exposure`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SuggestionResponse {
    pub status: String,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply from `GET /api/config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub has_deepseek_key: bool,
}

/// Transport to the suggestion backend.
pub trait SuggestionService: Send + Sync {
    fn fetch_status(&self) -> Result<ServiceStatus, SuggestError>;

    fn check_exposure(
        &self,
        request: &SuggestionRequest,
    ) -> Result<SuggestionResponse, SuggestError>;
}

/// HTTP transport using a blocking `ureq` agent.
pub struct HttpSuggestionService {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpSuggestionService {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl SuggestionService for HttpSuggestionService {
    fn fetch_status(&self) -> Result<ServiceStatus, SuggestError> {
        let response = self
            .agent
            .get(&self.url(CONFIG_PATH))
            .call()
            .map_err(Box::new)?;
        Ok(response.into_json()?)
    }

    fn check_exposure(
        &self,
        request: &SuggestionRequest,
    ) -> Result<SuggestionResponse, SuggestError> {
        match self
            .agent
            .post(&self.url(CHECK_EXPOSURE_PATH))
            .send_json(request)
        {
            Ok(response) => Ok(response.into_json()?),
            Err(ureq::Error::Status(code, response)) => response
                .into_json()
                .map_err(|_| SuggestError::Status(code)),
            Err(e) => Err(Box::new(e).into()),
        }
    }
}

/// Suggestion text to show the user, tagged with the parameters it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub text: String,
    pub requested_for: CameraParameters,
}

impl Alert {
    /// Whether the settings have moved on since this alert was requested.
    pub fn is_stale(&self, current: &CameraParameters) -> bool {
        self.requested_for != *current
    }
}

/// Decide what, if anything, to show for a backend reply.
///
/// - `rate_limit`: show the message
/// - a non-blank suggestion: show it
/// - anything else that is not `ok`: log the message only
pub fn alert_text(response: &SuggestionResponse) -> Option<String> {
    if response.status == RATE_LIMIT_STATUS {
        return Some(
            response
                .message
                .clone()
                .unwrap_or_else(|| "Too many requests, try again shortly".to_string()),
        );
    }
    match response.suggestion.as_deref() {
        Some(text) if !text.trim().is_empty() => Some(text.to_string()),
        _ => {
            if response.status != "ok" {
                info!(
                    "Exposure check: {}",
                    response.message.as_deref().unwrap_or("")
                );
            }
            None
        }
    }
}

/// Gatekeeper in front of a [`SuggestionService`].
pub struct SuggestionClient<S> {
    service: S,
    available: OnceLock<bool>,
}

impl<S: SuggestionService> SuggestionClient<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            available: OnceLock::new(),
        }
    }

    /// Whether the backend has a model key configured. Asked once, then cached.
    pub fn is_available(&self) -> bool {
        *self.available.get_or_init(|| match self.service.fetch_status() {
            Ok(status) => {
                info!("Suggestion backend key configured: {}", status.has_deepseek_key);
                status.has_deepseek_key
            }
            Err(e) => {
                warn!("Failed to check suggestion backend config: {e}");
                false
            }
        })
    }

    /// Ask for advice on a non-ok render.
    ///
    /// Returns `None` for ok exposures, when the backend is unavailable, on
    /// any failure, and when the backend has nothing worth showing.
    pub fn suggest(
        &self,
        params: &CameraParameters,
        classification: &ExposureClassification,
    ) -> Option<Alert> {
        if classification.status.is_ok() {
            return None;
        }
        if !self.is_available() {
            debug!("Suggestion backend not configured, skipping exposure check");
            return None;
        }

        let request = SuggestionRequest::new(params, classification);
        match self.service.check_exposure(&request) {
            Ok(response) => alert_text(&response).map(|text| Alert {
                text,
                requested_for: *params,
            }),
            Err(e) => {
                warn!("Failed to fetch exposure suggestion: {e}");
                None
            }
        }
    }
}

/// Request a suggestion on a background thread, delivering any alert on `tx`.
///
/// Fire and forget: rendering does not wait for the reply.
pub fn spawn_suggestion<S>(
    client: Arc<SuggestionClient<S>>,
    params: CameraParameters,
    classification: ExposureClassification,
    tx: Sender<Alert>,
) -> JoinHandle<()>
where
    S: SuggestionService + 'static,
{
    std::thread::spawn(move || {
        if let Some(alert) = client.suggest(&params, &classification) {
            // The receiver may be gone if the session already ended.
            let _ = tx.send(alert);
        }
    })
}
