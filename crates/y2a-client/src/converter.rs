//! Converter worker HTTP client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use y2a_models::{normalize_http_base, JobId, Node};

use crate::error::{ClientError, ClientResult};

/// Configuration for the converter client.
#[derive(Debug, Clone)]
pub struct ConverterClientConfig {
    /// Timeout for `POST /processing`
    pub dispatch_timeout: Duration,
    /// Timeout for `DELETE /delete/{item}`
    pub delete_timeout: Duration,
}

impl Default for ConverterClientConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout: Duration::from_secs(30),
            delete_timeout: Duration::from_secs(5),
        }
    }
}

impl ConverterClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            dispatch_timeout: Duration::from_secs(
                std::env::var("DISPATCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            delete_timeout: Duration::from_secs(
                std::env::var("DELETE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

/// Body of a dispatch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub job_id: JobId,
    pub link: String,
}

/// Client for converter workers.
#[derive(Clone)]
pub struct ConverterClient {
    http: Client,
    config: ConverterClientConfig,
}

impl ConverterClient {
    /// Create a new converter client.
    pub fn new(config: ConverterClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("y2a-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ConverterClientConfig::from_env())
    }

    /// Hand a job to `node`. Any 2xx counts as accepted.
    pub async fn dispatch(&self, node: &Node, request: &DispatchRequest) -> ClientResult<()> {
        let url = format!("{}/processing", normalize_http_base(&node.address));

        debug!(job_id = %request.job_id, node = %node.name, "Dispatching to {}", url);

        let response = self
            .http
            .post(&url)
            .timeout(self.config.dispatch_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::remote_dispatch(&node.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                job_id = %request.job_id,
                node = %node.name,
                "Converter rejected job with {}: {}", status, body
            );
            return Err(ClientError::UnexpectedStatus {
                node: node.name.clone(),
                status: status.as_u16(),
            });
        }

        Ok(())
    }

    /// Ask `node` to delete the artifact for `item`. Only `200 OK` counts.
    pub async fn delete(&self, node: &Node, item: &str) -> ClientResult<()> {
        let url = format!("{}/delete/{}", normalize_http_base(&node.address), item);

        debug!(item, node = %node.name, "Deleting on {}", url);

        let response = self
            .http
            .delete(&url)
            .timeout(self.config.delete_timeout)
            .send()
            .await
            .map_err(|e| ClientError::remote_dispatch(&node.name, e.to_string()))?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(ClientError::UnexpectedStatus {
                node: node.name.clone(),
                status: status.as_u16(),
            }),
        }
    }
}
