//! Consul KV HTTP client.
//!
//! Only the recursive listing is used: `GET /v1/kv/<prefix>?recurse`, with
//! `index`/`wait` for blocking queries. The listing's version is the
//! `X-Consul-Index` response header.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::DirectoryConfig;
use crate::error::{FleetError, FleetResult};

const INDEX_HEADER: &str = "X-Consul-Index";

/// One key/value pair under the prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: Vec<u8>,
}

/// Result of a recursive listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvListing {
    /// Consul's index at the time of the listing
    pub index: u64,
    pub entries: Vec<KvEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawKvPair {
    key: String,
    #[serde(default)]
    value: Option<String>,
}

/// Consul KV client.
#[derive(Clone)]
pub struct ConsulClient {
    http: Client,
    base_url: String,
}

impl ConsulClient {
    /// Create a new client.
    pub fn new(config: &DirectoryConfig) -> FleetResult<Self> {
        let http = Client::builder()
            .timeout(config.client_timeout())
            .connect_timeout(config.request_timeout)
            .user_agent(concat!("y2a-fleet/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FleetError::Network)?;

        let addr = config.consul_addr.trim_end_matches('/');
        let base_url = if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.to_string()
        } else {
            format!("http://{}", addr)
        };

        Ok(Self { http, base_url })
    }

    /// List every key under `prefix`.
    ///
    /// With `wait` set and a non-zero `index`, Consul holds the request until
    /// the index moves past `index` or `wait` elapses.
    pub async fn list(
        &self,
        prefix: &str,
        index: u64,
        wait: Option<Duration>,
    ) -> FleetResult<KvListing> {
        let url = format!("{}/v1/kv/{}", self.base_url, prefix.trim_start_matches('/'));

        let mut query = vec![
            ("recurse", "true".to_string()),
            ("stale", "true".to_string()),
        ];
        if let Some(wait) = wait.filter(|_| index > 0) {
            query.push(("index", index.to_string()));
            query.push(("wait", format!("{}s", wait.as_secs().max(1))));
        }

        debug!(url = %url, index, "Listing Consul KV");

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| FleetError::connect(e.to_string()))?;

        let status = response.status();
        let listing_index = parse_index(response.headers().get(INDEX_HEADER));

        match status {
            StatusCode::OK => {
                let index = listing_index.ok_or_else(|| {
                    FleetError::invalid_response(format!("missing {} header", INDEX_HEADER))
                })?;
                let body = response.bytes().await?;
                let raw: Vec<RawKvPair> = serde_json::from_slice(&body)?;
                let entries = raw
                    .into_iter()
                    .map(decode_pair)
                    .collect::<FleetResult<Vec<_>>>()?;
                Ok(KvListing { index, entries })
            }
            // Nothing registered under the prefix yet
            StatusCode::NOT_FOUND => Ok(KvListing {
                index: listing_index.unwrap_or(0),
                entries: Vec::new(),
            }),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(FleetError::Status(status.as_u16(), body))
            }
        }
    }
}

fn parse_index(value: Option<&reqwest::header::HeaderValue>) -> Option<u64> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

fn decode_pair(pair: RawKvPair) -> FleetResult<KvEntry> {
    let value = match pair.value {
        Some(encoded) => STANDARD.decode(encoded.as_bytes()).map_err(|e| {
            FleetError::invalid_response(format!("bad value for {}: {}", pair.key, e))
        })?,
        None => Vec::new(),
    };
    Ok(KvEntry {
        key: pair.key,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pair() {
        let pair = RawKvPair {
            key: "test/ffmpeg/n1".into(),
            value: Some(STANDARD.encode("10.0.0.1:9000")),
        };
        let entry = decode_pair(pair).unwrap();
        assert_eq!(entry.key, "test/ffmpeg/n1");
        assert_eq!(entry.value, b"10.0.0.1:9000");
    }

    #[test]
    fn test_decode_pair_null_value() {
        let pair: RawKvPair = serde_json::from_str(r#"{"Key":"test/ffmpeg/","Value":null}"#).unwrap();
        assert!(decode_pair(pair).unwrap().value.is_empty());
    }

    #[test]
    fn test_decode_pair_rejects_bad_base64() {
        let pair = RawKvPair {
            key: "k".into(),
            value: Some("***".into()),
        };
        assert!(matches!(
            decode_pair(pair),
            Err(FleetError::InvalidResponse(_))
        ));
    }
}
