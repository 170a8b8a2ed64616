//! HTTP client for a Kubo-compatible RPC endpoint.
//!
//! Kubo exposes every command as `POST /api/v0/<command>?arg=...`. Errors
//! come back as a non-2xx status with a JSON body carrying a `Message`
//! field. [`KuboClient`] wraps that plumbing and is shared by the content
//! store here and the naming service in `hdx-names`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use hdx_types::ContentHash;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::ContentStore;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the Kubo RPC transport.
#[derive(Debug, thiserror::Error)]
pub enum KuboError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with a non-success status.
    #[error("RPC error ({status}): {message}")]
    Rpc { status: u16, message: String },

    /// The node answered 2xx but the body could not be decoded.
    #[error("undecodable RPC response: {0}")]
    Decode(String),
}

impl KuboError {
    /// Kubo reports missing blocks and unresolvable names as server errors;
    /// the message is the only way to tell them apart from real failures.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Rpc { message, .. } => {
                let message = message.to_ascii_lowercase();
                message.contains("not found") || message.contains("could not resolve")
            }
            _ => false,
        }
    }
}

/// Thin RPC client for a Kubo node or a compatible pinning gateway.
#[derive(Clone)]
pub struct KuboClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl KuboClient {
    /// Creates a client targeting the given base URL (e.g. `http://127.0.0.1:5001`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client whose individual requests give up after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into(),
            token: None,
            http,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, command: &str) -> String {
        format!("{}/api/v0/{command}", self.base_url.trim_end_matches('/'))
    }

    fn request(&self, command: &str, args: &[(&str, &str)]) -> reqwest::RequestBuilder {
        let mut request = self.http.post(self.endpoint(command)).query(args);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, KuboError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.bytes().await?;
        let message = serde_json::from_slice::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("Message")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| String::from_utf8_lossy(&body).to_string());
        Err(KuboError::Rpc {
            status: status.as_u16(),
            message,
        })
    }

    /// Run `command` and decode the JSON response body.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        command: &str,
        args: &[(&str, &str)],
    ) -> Result<T, KuboError> {
        debug!(command, "kubo rpc");
        let response = self.send(self.request(command, args)).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| KuboError::Decode(format!("{command}: {e}")))
    }

    /// Run `command` and return the raw response body.
    pub async fn call_bytes(&self, command: &str, args: &[(&str, &str)]) -> Result<Bytes, KuboError> {
        debug!(command, "kubo rpc");
        let response = self.send(self.request(command, args)).await?;
        Ok(response.bytes().await?)
    }

    /// Upload `data` as a single file via `add`.
    pub async fn add(&self, data: Bytes) -> Result<AddResponse, KuboError> {
        let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name("blob");
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self
            .request("add", &[("cid-version", "1"), ("pin", "true")])
            .multipart(form);
        let response = self.send(request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| KuboError::Decode(format!("add: {e}")))
    }
}

impl std::fmt::Debug for KuboClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KuboClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

/// Response body of `add`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddResponse {
    pub name: String,
    pub hash: String,
    #[serde(default)]
    pub size: Option<String>,
}

/// [`ContentStore`] backed by a Kubo node: `add` to store, `cat` to fetch.
#[derive(Clone, Debug)]
pub struct KuboContentStore {
    client: KuboClient,
}

impl KuboContentStore {
    pub fn new(client: KuboClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &KuboClient {
        &self.client
    }
}

#[async_trait]
impl ContentStore for KuboContentStore {
    async fn put(&self, data: Bytes) -> StoreResult<ContentHash> {
        let response = self.client.add(data).await?;
        let hash = ContentHash::parse(&response.hash)?;
        debug!(hash = %hash.short(), "uploaded blob");
        Ok(hash)
    }

    async fn get(&self, hash: &ContentHash) -> StoreResult<Bytes> {
        match self.client.call_bytes("cat", &[("arg", hash.as_str())]).await {
            Ok(data) => Ok(data),
            Err(err) if err.is_not_found() => Err(StoreError::NotFound(hash.clone())),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    fn mock_node() -> Router {
        Router::new()
            .route(
                "/api/v0/add",
                post(|| async { Json(json!({"Name": "blob", "Hash": "bafkreitest", "Size": "5"})) }),
            )
            .route(
                "/api/v0/cat",
                post(|Query(query): Query<HashMap<String, String>>| async move {
                    if query.get("arg").map(String::as_str) == Some("bafkreitest") {
                        (StatusCode::OK, "hello").into_response()
                    } else {
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(json!({
                                "Message": "block was not found locally (offline)",
                                "Code": 0,
                                "Type": "error"
                            })),
                        )
                            .into_response()
                    }
                }),
            )
    }

    #[tokio::test]
    async fn put_returns_hash_from_node() {
        let url = spawn_server(mock_node()).await;
        let store = KuboContentStore::new(KuboClient::new(url));
        let hash = store.put(Bytes::from_static(b"hello")).await.unwrap();
        assert_eq!(hash.as_str(), "bafkreitest");
    }

    #[tokio::test]
    async fn get_returns_body() {
        let url = spawn_server(mock_node()).await;
        let store = KuboContentStore::new(KuboClient::new(url));
        let hash = ContentHash::parse("bafkreitest").unwrap();
        let data = store.get(&hash).await.unwrap();
        assert_eq!(&data[..], b"hello");
    }

    #[tokio::test]
    async fn missing_block_maps_to_not_found() {
        let url = spawn_server(mock_node()).await;
        let store = KuboContentStore::new(KuboClient::new(url));
        let hash = ContentHash::parse("bafkreimissing").unwrap();
        let err = store.get(&hash).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(h) if h == hash));
    }

    #[tokio::test]
    async fn unreachable_node_is_transient() {
        // Port 9 (discard) on localhost is not expected to run a Kubo node.
        let store = KuboContentStore::new(KuboClient::with_timeout(
            "http://127.0.0.1:9",
            Duration::from_secs(2),
        ));
        let err = store.put(Bytes::from_static(b"x")).await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn bearer_token_is_sent() {
        let app = Router::new().route(
            "/api/v0/add",
            post(|headers: HeaderMap| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer secret");
                if authorized {
                    Json(json!({"Name": "blob", "Hash": "bafkreiauth"})).into_response()
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({"Message": "unauthorized"})))
                        .into_response()
                }
            }),
        );
        let url = spawn_server(app).await;

        let anonymous = KuboContentStore::new(KuboClient::new(url.clone()));
        let err = anonymous.put(Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidResponse(ref m) if m.contains("unauthorized")));

        let authorized = KuboContentStore::new(KuboClient::new(url).with_token("secret"));
        let hash = authorized.put(Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(hash.as_str(), "bafkreiauth");
    }

    #[test]
    fn not_found_detection() {
        let err = KuboError::Rpc {
            status: 500,
            message: "could not resolve name".into(),
        };
        assert!(err.is_not_found());
        let err = KuboError::Rpc {
            status: 500,
            message: "internal failure".into(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = KuboClient::new("http://localhost:5001/");
        assert_eq!(client.endpoint("cat"), "http://localhost:5001/api/v0/cat");
    }
}
