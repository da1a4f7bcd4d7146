//! Upstream Alma gateway
//!
//! `UpstreamClient` is the transport seam: it fetches a URL and classifies
//! failures. `AlmaGateway` builds the Alma API calls on top of it.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    config::AlmaConfig,
    error::{AppError, AppResult, UpstreamFault},
    xml::Element,
};

/// Query parameters of an upstream request, in order
pub type QueryParams = [(String, String)];

/// Fetch-by-URL primitive used by the engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Fetch `url` with the given query parameters and return the raw body
    async fn fetch(&self, url: &str, params: &QueryParams) -> Result<Vec<u8>, UpstreamFault>;
}

/// HTTP implementation of [`UpstreamClient`]
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(config: &AlmaConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn fetch(&self, url: &str, params: &QueryParams) -> Result<Vec<u8>, UpstreamFault> {
        tracing::debug!("url={}, params={:?}", url, params);

        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(transport_fault)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_fault)?;
        let elapsed = start.elapsed().as_secs_f64();

        if status.is_success() {
            tracing::info!(
                http_status_code = status.as_u16(),
                request_response_time_in_secs = elapsed,
                "Received {} from '{}'",
                status.as_u16(),
                url
            );
            return Ok(body.to_vec());
        }

        tracing::warn!(
            http_status_code = status.as_u16(),
            request_response_time_in_secs = elapsed,
            "Received {} from '{}'",
            status.as_u16(),
            url
        );
        if status == reqwest::StatusCode::BAD_REQUEST {
            for line in error_diagnostics(&body) {
                tracing::warn!("{}", line);
            }
        }

        Err(UpstreamFault::from_status(status))
    }
}

fn transport_fault(e: reqwest::Error) -> UpstreamFault {
    if e.is_timeout() {
        UpstreamFault::Timeout
    } else {
        // the URL carries the API key
        UpstreamFault::Transport(e.without_url().to_string())
    }
}

/// Describe the errors listed in an Alma XML error body
pub fn error_diagnostics(content: &[u8]) -> Vec<String> {
    if content.is_empty() {
        return vec!["Failed to retrieve xml from Alma API".to_string()];
    }

    let errors = match Element::parse(content) {
        Ok(root) => root.find_all("error").into_iter().cloned().collect::<Vec<_>>(),
        Err(_) => Vec::new(),
    };
    if errors.is_empty() {
        return vec!["Failed to find errors in content".to_string()];
    }

    let mut lines = Vec::new();
    for error in &errors {
        match (error.find("errorCode"), error.find("errorMessage")) {
            (Some(code), Some(message)) => {
                lines.push(format!("Alma API error {}: {}", code.text(), message.text()));
            }
            _ => {
                lines.push("Failed to retrieve error code and/or message in content".to_string());
                break;
            }
        }
    }
    lines
}

/// Builds Alma API calls
#[derive(Clone)]
pub struct AlmaGateway {
    client: Arc<dyn UpstreamClient>,
    config: AlmaConfig,
}

impl AlmaGateway {
    pub fn new(client: Arc<dyn UpstreamClient>, config: AlmaConfig) -> Self {
        Self { client, config }
    }

    fn bibs_url(&self) -> String {
        format!("{}{}", self.config.host, self.config.endpoint)
    }

    /// Query availability for a set of bibs in a single request
    pub async fn retrieve_bibs(&self, mms_ids: &BTreeSet<String>) -> AppResult<Vec<u8>> {
        let params = vec![
            ("mms_id".to_string(), mms_ids.iter().map(String::as_str).collect::<Vec<_>>().join(",")),
            ("view".to_string(), "full".to_string()),
            ("expand".to_string(), "p_avail".to_string()),
            ("apikey".to_string(), self.config.api_key.clone()),
        ];
        Ok(self.client.fetch(&self.bibs_url(), &params).await?)
    }

    /// Query the items of one holding
    pub async fn retrieve_holding_items(&self, mms_id: &str, holding_id: &str) -> AppResult<Vec<u8>> {
        let url = format!(
            "{}/{}/holdings/{}/items",
            self.bibs_url().trim_end_matches('/'),
            mms_id,
            holding_id
        );
        Ok(self.client.fetch(&url, &self.link_params()).await?)
    }

    /// Follow a link embedded in an Alma response
    pub async fn retrieve_additional(&self, url: &str) -> AppResult<Vec<u8>> {
        Ok(self.client.fetch(url, &self.link_params()).await?)
    }

    fn link_params(&self) -> Vec<(String, String)> {
        vec![
            ("apikey".to_string(), self.config.api_key.clone()),
            ("expand".to_string(), "due_date".to_string()),
        ]
    }
}
