//! Agent/coordinator message contract.
//!
//! The coordinator owns the privileged pieces (network fetch, stores); the
//! scanning agent talks to it only through [`Request`] and [`Response`],
//! serialized as JSON.
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sweep_logging::{sweep_debug, sweep_error, sweep_info, sweep_warn};
use tagsweep_core::{Settings, Stats};

use crate::{Classification, ClassifyError, PageClassifier, Store};

const KNOWN_ACTIONS: &[&str] = &[
    "fetchPage",
    "updateStats",
    "getStats",
    "getSettings",
    "saveSettings",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    FetchPage { url: String },
    UpdateStats { stats: Stats },
    GetStats,
    GetSettings,
    SaveSettings { settings: Settings },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("Unknown action")]
    UnknownAction(String),
    #[error("Malformed request: {0}")]
    Malformed(String),
}

impl Request {
    pub fn from_json(raw: &str) -> Result<Self, MessageError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|err| MessageError::Malformed(err.to_string()))?;
        let action = value
            .get("action")
            .and_then(|action| action.as_str())
            .unwrap_or_default();
        if !KNOWN_ACTIONS.contains(&action) {
            return Err(MessageError::UnknownAction(action.to_string()));
        }
        serde_json::from_value(value).map_err(|err| MessageError::Malformed(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limited: Option<bool>,
    /// Structured form of `error` for fetch failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ClassifyError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    fn classified(classification: Classification) -> Self {
        Self {
            matches: Some(classification.matches),
            url: Some(classification.url),
            ..Self::ok()
        }
    }

    fn fetch_failed(url: &str, err: &ClassifyError) -> Self {
        Self {
            url: Some(url.to_string()),
            rate_limited: Some(err.is_rate_limited()),
            failure: Some(err.clone()),
            ..Self::failure(err.to_string())
        }
    }
}

/// Privileged side of the boundary: performs fetches and owns the stores.
pub struct Coordinator {
    classifier: Arc<dyn PageClassifier>,
    store: Arc<dyn Store>,
}

impl Coordinator {
    pub fn new(classifier: Arc<dyn PageClassifier>, store: Arc<dyn Store>) -> Self {
        Self { classifier, store }
    }

    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::FetchPage { url } => {
                sweep_debug!("Coordinator fetching {}", url);
                match self.classifier.classify(&url).await {
                    Ok(classification) => Response::classified(classification),
                    Err(err) => {
                        sweep_warn!("Fetch of {} failed: {}", url, err);
                        Response::fetch_failed(&url, &err)
                    }
                }
            }
            Request::UpdateStats { stats } => match self.store.add_stats(&stats) {
                Ok(_) => Response::ok(),
                Err(err) => {
                    sweep_error!("Error updating stats: {}", err);
                    Response::failure(err.to_string())
                }
            },
            Request::GetStats => match self.store.load_stats() {
                Ok(stats) => Response {
                    stats: Some(stats),
                    ..Response::ok()
                },
                Err(err) => Response::failure(err.to_string()),
            },
            Request::GetSettings => match self.store.load_settings() {
                Ok(settings) => Response {
                    settings: Some(settings),
                    ..Response::ok()
                },
                Err(err) => Response::failure(err.to_string()),
            },
            Request::SaveSettings { settings } => {
                match self.store.save_settings(&settings.normalized()) {
                    Ok(()) => {
                        sweep_info!("Settings saved");
                        Response::ok()
                    }
                    Err(err) => {
                        sweep_error!("Error saving settings: {}", err);
                        Response::failure(err.to_string())
                    }
                }
            }
        }
    }

    /// JSON in, JSON out.
    pub async fn handle_json(&self, raw: &str) -> String {
        let response = match Request::from_json(raw) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                sweep_warn!("Rejected message: {}", err);
                Response::failure(err.to_string())
            }
        };
        serde_json::to_string(&response).unwrap_or_else(|err| {
            format!("{{\"success\":false,\"error\":\"{}\"}}", err.to_string().replace('"', "'"))
        })
    }
}

/// Agent-side classifier that goes through the coordinator's JSON boundary.
pub struct MessagingClassifier {
    coordinator: Arc<Coordinator>,
}

impl MessagingClassifier {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }
}

#[async_trait::async_trait]
impl PageClassifier for MessagingClassifier {
    async fn classify(&self, url: &str) -> Result<Classification, ClassifyError> {
        let request = serde_json::to_string(&Request::FetchPage {
            url: url.to_string(),
        })
        .map_err(|err| ClassifyError::Network(err.to_string()))?;
        let raw = self.coordinator.handle_json(&request).await;
        let response: Response =
            serde_json::from_str(&raw).map_err(|err| ClassifyError::ParseError(err.to_string()))?;

        match response {
            Response {
                success: true,
                matches,
                url: echoed,
                ..
            } => Ok(Classification {
                url: echoed.unwrap_or_else(|| url.to_string()),
                matches: matches.unwrap_or(false),
            }),
            Response {
                failure: Some(failure),
                ..
            } => Err(failure),
            Response {
                rate_limited: Some(true),
                ..
            } => Err(ClassifyError::RateLimited),
            Response { error, .. } => Err(ClassifyError::Network(
                error.unwrap_or_else(|| "Failed to fetch page".to_string()),
            )),
        }
    }
}
