use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::StatusCode;
use sweep_logging::{sweep_debug, sweep_warn};
use tagsweep_core::Settings;

use crate::{decode_body, Classification, ClassifyError, TagMatcher};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Politeness delay applied before every request.
    pub request_delay: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
    pub user_agent: String,
    pub target_tag: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl FetchSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            request_delay: settings.request_delay(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: settings.request_timeout(),
            max_bytes: 5 * 1024 * 1024,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/124.0 Safari/537.36"
                .to_string(),
            target_tag: settings.target_tag.clone(),
        }
    }
}

/// Fetch-and-classify contract: does the page at `url` carry the target tag?
#[async_trait::async_trait]
pub trait PageClassifier: Send + Sync {
    async fn classify(&self, url: &str) -> Result<Classification, ClassifyError>;
}

pub struct ReqwestClassifier {
    settings: FetchSettings,
    client: reqwest::Client,
    matcher: TagMatcher,
}

impl ReqwestClassifier {
    pub fn new(settings: FetchSettings) -> Result<Self, ClassifyError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| ClassifyError::Network(err.to_string()))?;
        let matcher = TagMatcher::new(&settings.target_tag);
        Ok(Self {
            settings,
            client,
            matcher,
        })
    }

    /// GET `url` and decode the body, without the politeness delay.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ClassifyError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|err| ClassifyError::InvalidUrl(err.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            sweep_warn!("Rate limited while fetching {}", url);
            return Err(ClassifyError::RateLimited);
        }
        if !status.is_success() {
            return Err(ClassifyError::HttpError {
                status: status.as_u16(),
            });
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, content_len));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        decode_body(&bytes, content_type.as_deref())
    }
}

#[async_trait::async_trait]
impl PageClassifier for ReqwestClassifier {
    async fn classify(&self, url: &str) -> Result<Classification, ClassifyError> {
        if !self.settings.request_delay.is_zero() {
            tokio::time::sleep(self.settings.request_delay).await;
        }

        let html = self.fetch_html(url).await?;
        let matches = self.matcher.matches_html(&html);
        sweep_debug!(
            "{} {} tag '{}'",
            url,
            if matches { "has" } else { "lacks" },
            self.settings.target_tag
        );

        Ok(Classification {
            url: url.to_string(),
            matches,
        })
    }
}

fn too_large(max_bytes: u64, actual: u64) -> ClassifyError {
    ClassifyError::ParseError(format!(
        "response too large (max {max_bytes}, actual {actual})"
    ))
}

fn map_reqwest_error(err: reqwest::Error) -> ClassifyError {
    if err.is_timeout() {
        return ClassifyError::Timeout;
    }
    if let Some(status) = err.status() {
        return ClassifyError::HttpError {
            status: status.as_u16(),
        };
    }
    ClassifyError::Network(err.to_string())
}
