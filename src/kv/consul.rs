//! Consul KV Adapter
//!
//! Read-only client for the Consul HTTP KV API, scoped to a key prefix.
//! Values come back base64-encoded and are decoded to UTF-8 strings.
//!
//! With batching enabled, concurrent lookups of the same key share one
//! HTTP request; every waiter receives the same entries or the same error.

use super::endpoint::ConsulEndpoint;
use crate::domain::ports::{KvClientParams, KvConnector, KvEntries, KvStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Consul client
#[derive(Debug, Clone)]
pub struct ConsulConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// ACL token sent as `X-Consul-Token`
    pub token: Option<String>,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            token: None,
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// One element of a `GET /v1/kv/<key>` response
#[derive(Debug, Clone, Deserialize)]
struct ConsulKvPair {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value")]
    value: Option<String>,
}

// =============================================================================
// HTTP Transport
// =============================================================================

struct ConsulHttp {
    client: reqwest::Client,
    base_url: String,
    prefix: String,
    token: Option<String>,
}

impl ConsulHttp {
    fn kv_url(&self, key: &str) -> String {
        let full_key = format!("{}{}", self.prefix, key);
        let encoded: Vec<String> = full_key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/v1/kv/{}", self.base_url, encoded.join("/"))
    }

    async fn fetch(&self, key: &str) -> Result<KvEntries> {
        let url = self.kv_url(key);
        debug!("Fetching KV entries from {}", url);

        let mut request = self.client.get(&url).query(&[("recurse", "true")]);
        if let Some(token) = &self.token {
            request = request.header("X-Consul-Token", token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(Error::KvKeyNotFound {
                key: key.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::KvResponse {
                status: status.as_u16(),
                body,
            });
        }

        let pairs: Vec<ConsulKvPair> = response.json().await?;
        let mut entries = KvEntries::new();
        for pair in pairs {
            let value = match pair.value {
                Some(encoded) => decode_value(&pair.key, &encoded)?,
                None => String::new(),
            };
            let relative = pair
                .key
                .strip_prefix(self.prefix.as_str())
                .unwrap_or(&pair.key)
                .to_string();
            entries.insert(relative, value);
        }

        debug!("Fetched {} KV entries under {}", entries.len(), key);
        Ok(entries)
    }
}

fn decode_value(key: &str, encoded: &str) -> Result<String> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| Error::KvDecode(format!("{}: {}", key, e)))?;
    String::from_utf8(bytes).map_err(|e| Error::KvDecode(format!("{}: {}", key, e)))
}

// =============================================================================
// Consul KV Store
// =============================================================================

type SharedFetch = Shared<BoxFuture<'static, std::result::Result<KvEntries, Arc<Error>>>>;

/// Consul-backed [`KvStore`]
pub struct ConsulKvStore {
    http: Arc<ConsulHttp>,
    batching: bool,
    /// In-flight lookups by key, only used with batching
    inflight: Mutex<HashMap<String, SharedFetch>>,
}

impl ConsulKvStore {
    /// Create a client for `endpoint`, scoped to `prefix`
    pub fn new(
        endpoint: &ConsulEndpoint,
        prefix: &str,
        enable_batching: bool,
        config: ConsulConfig,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http: Arc::new(ConsulHttp {
                client,
                base_url: endpoint.base_url(),
                prefix: normalize_prefix(prefix),
                token: config.token,
            }),
            batching: enable_batching,
            inflight: Mutex::new(HashMap::new()),
        })
    }

    /// Whether identical in-flight requests are coalesced
    pub fn batching_enabled(&self) -> bool {
        self.batching
    }

    async fn get_coalesced(&self, key: &str) -> Result<KvEntries> {
        let fetch = {
            let mut inflight = self.inflight.lock();
            inflight
                .entry(key.to_string())
                .or_insert_with(|| {
                    let http = Arc::clone(&self.http);
                    let key = key.to_string();
                    async move { http.fetch(&key).await.map_err(Arc::new) }
                        .boxed()
                        .shared()
                })
                .clone()
        };

        let result = fetch.clone().await;

        {
            let mut inflight = self.inflight.lock();
            if inflight.get(key).is_some_and(|f| f.ptr_eq(&fetch)) {
                inflight.remove(key);
            }
        }

        result.map_err(Error::Shared)
    }
}

#[async_trait]
impl KvStore for ConsulKvStore {
    async fn get(&self, key: &str) -> Result<KvEntries> {
        if self.batching {
            self.get_coalesced(key).await
        } else {
            self.http.fetch(key).await
        }
    }

    fn prefix(&self) -> &str {
        &self.http.prefix
    }
}

/// Ensure a non-empty prefix ends with `/`
fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

// =============================================================================
// Connector
// =============================================================================

/// [`KvConnector`] producing [`ConsulKvStore`] clients
#[derive(Debug, Clone, Default)]
pub struct ConsulConnector {
    config: ConsulConfig,
}

impl ConsulConnector {
    pub fn new(config: ConsulConfig) -> Self {
        Self { config }
    }
}

impl KvConnector for ConsulConnector {
    fn connect(&self, params: &KvClientParams) -> Result<Arc<dyn KvStore>> {
        let endpoint = ConsulEndpoint {
            scheme: params.scheme.clone(),
            host: params.host.clone(),
            port: params.port,
        };

        info!(
            "Connecting to Consul at {} (prefix: {}, batching: {})",
            endpoint, params.prefix, params.enable_batching
        );

        let store = ConsulKvStore::new(
            &endpoint,
            &params.prefix,
            params.enable_batching,
            self.config.clone(),
        )?;
        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn encode(value: &str) -> String {
        BASE64.encode(value)
    }

    fn store_for(server: &MockServer, batching: bool, config: ConsulConfig) -> ConsulKvStore {
        let endpoint = ConsulEndpoint::parse(&server.uri()).unwrap();
        ConsulKvStore::new(&endpoint, "ha/v1", batching, config).unwrap()
    }

    #[tokio::test]
    async fn test_get_decodes_and_strips_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/kv/ha/v1/pvtfqdn_to_nodeid"))
            .and(query_param("recurse", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "Key": "ha/v1/pvtfqdn_to_nodeid/node1", "Value": encode("id-A"), "Flags": 0 },
                { "Key": "ha/v1/pvtfqdn_to_nodeid/node2", "Value": encode("id-B"), "Flags": 0 },
                { "Key": "ha/v1/pvtfqdn_to_nodeid/", "Value": null, "Flags": 0 }
            ])))
            .mount(&server)
            .await;

        let store = store_for(&server, false, ConsulConfig::default());
        assert_eq!(store.prefix(), "ha/v1/");

        let entries = store.get("pvtfqdn_to_nodeid").await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries["pvtfqdn_to_nodeid/node1"], "id-A");
        assert_eq!(entries["pvtfqdn_to_nodeid/node2"], "id-B");
        assert_eq!(entries["pvtfqdn_to_nodeid/"], "");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = store_for(&server, false, ConsulConfig::default());
        let err = store.get("pvtfqdn_to_nodeid/ghost").await.unwrap_err();
        assert_matches!(err, Error::KvKeyNotFound { ref key } if key == "pvtfqdn_to_nodeid/ghost");
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("No cluster leader"))
            .mount(&server)
            .await;

        let store = store_for(&server, false, ConsulConfig::default());
        let err = store.get("pvtfqdn_to_nodeid").await.unwrap_err();
        assert_matches!(err, Error::KvResponse { status: 500, .. });
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_invalid_base64_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "Key": "ha/v1/pvtfqdn_to_nodeid/node1", "Value": "!!not-base64!!" }
            ])))
            .mount(&server)
            .await;

        let store = store_for(&server, false, ConsulConfig::default());
        assert_matches!(
            store.get("pvtfqdn_to_nodeid").await,
            Err(Error::KvDecode(_))
        );
    }

    #[tokio::test]
    async fn test_token_header_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("X-Consul-Token", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "Key": "ha/v1/k", "Value": encode("v") }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let config = ConsulConfig {
            token: Some("secret".into()),
            ..Default::default()
        };
        let store = store_for(&server, false, config);
        assert_eq!(store.get("k").await.unwrap()["k"], "v");
    }

    #[tokio::test]
    async fn test_batching_coalesces_concurrent_lookups() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/kv/ha/v1/pvtfqdn_to_nodeid"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([
                        { "Key": "ha/v1/pvtfqdn_to_nodeid/node1", "Value": encode("id-A") }
                    ]))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, true, ConsulConfig::default());
        assert!(store.batching_enabled());

        let (a, b) = tokio::join!(store.get("pvtfqdn_to_nodeid"), store.get("pvtfqdn_to_nodeid"));
        assert_eq!(a.unwrap(), b.unwrap());
        assert!(store.inflight.lock().is_empty());
    }

    #[tokio::test]
    async fn test_coalesced_failure_is_shared() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_millis(100)))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, true, ConsulConfig::default());
        let (a, b) = tokio::join!(store.get("missing"), store.get("missing"));

        let a = a.unwrap_err();
        assert_matches!(a, Error::Shared(_));
        assert!(a.is_not_found());
        assert!(b.unwrap_err().is_not_found());
    }

    #[test]
    fn test_kv_url_encodes_segments() {
        let endpoint = ConsulEndpoint::parse("http://127.0.0.1:8500").unwrap();
        let store = ConsulKvStore::new(&endpoint, "ha/v1/", false, ConsulConfig::default()).unwrap();
        assert_eq!(
            store.http.kv_url("pvtfqdn_to_nodeid/node 1"),
            "http://127.0.0.1:8500/v1/kv/ha/v1/pvtfqdn_to_nodeid/node%201"
        );
    }

    #[test]
    fn test_connector_builds_client() {
        let params = KvClientParams {
            prefix: "ha/v1/".into(),
            scheme: "tcp".into(),
            host: "consul".into(),
            port: 8500,
            enable_batching: true,
        };
        let client = ConsulConnector::default().connect(&params).unwrap();
        assert_eq!(client.prefix(), "ha/v1/");
    }
}
