//! reqwest implementation of [`RemoteBridge`] against the bridge's REST API.

use crate::{
    BridgeError, BridgeResult, DatabaseSnapshotToken, Device, PackageEntry, PackageFilter,
    PullResponse, PullTarget, QueryResponse, RemoteBridge, TablePage,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// `{"error": "..."}` body used by the bridge for every structured failure.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

#[derive(Deserialize)]
struct DebuggableStatus {
    debuggable: bool,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// HTTP client for the bridge.
#[derive(Clone)]
pub struct HttpBridge {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpBridge {
    /// Create a client for the bridge at `base_url`.
    ///
    /// `timeout` bounds each request end to end.
    pub fn new(base_url: Url, timeout: Duration) -> BridgeResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(BridgeError::InvalidUrl(base_url.to_string()));
        }
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("dbtap/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/api/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> BridgeResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BridgeError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> BridgeResult<T> {
        tracing::debug!(method = "GET", url = %url, "bridge request");
        let response = self.http_client.get(url).send().await?;
        read_response(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> BridgeResult<T> {
        tracing::debug!(method = "POST", url = %url, "bridge request");
        let response = self.http_client.post(url).json(body).send().await?;
        read_response(response).await
    }
}

async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> BridgeResult<T> {
    let status = response.status();
    let body = response.text().await?;
    decode_body(status, &body)
}

/// Classify a response body.
///
/// A body of the expected shape on a success status is the answer. Otherwise
/// an `{error}` body becomes [`BridgeError::Remote`] regardless of status.
fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> BridgeResult<T> {
    let decode_err = if status.is_success() {
        match serde_json::from_str::<T>(body) {
            Ok(value) => return Ok(value),
            Err(err) => Some(err),
        }
    } else {
        None
    };

    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        tracing::debug!(status = status.as_u16(), error = %envelope.error, "bridge error");
        return Err(BridgeError::Remote(envelope.error));
    }

    match decode_err {
        Some(err) => Err(BridgeError::Decode(err)),
        None => {
            tracing::warn!(status = status.as_u16(), body_len = body.len(), "unexpected bridge status");
            Err(BridgeError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            })
        }
    }
}

#[async_trait]
impl RemoteBridge for HttpBridge {
    async fn list_devices(&self) -> BridgeResult<Vec<Device>> {
        self.get(self.endpoint(&["devices"])?).await
    }

    async fn list_packages(
        &self,
        device_id: &str,
        filter: PackageFilter,
    ) -> BridgeResult<Vec<PackageEntry>> {
        let mut url = self.endpoint(&["packages", device_id])?;
        url.query_pairs_mut().append_pair("filter", filter.as_str());
        self.get(url).await
    }

    async fn resolve_debuggable(&self, device_id: &str, package_name: &str) -> BridgeResult<bool> {
        let url = self.endpoint(&["package-debuggable", device_id, package_name])?;
        let status: DebuggableStatus = self.get(url).await?;
        Ok(status.debuggable)
    }

    async fn list_databases(
        &self,
        device_id: &str,
        package_name: &str,
    ) -> BridgeResult<Vec<String>> {
        self.get(self.endpoint(&["databases", device_id, package_name])?)
            .await
    }

    async fn pull_database(&self, target: &PullTarget) -> BridgeResult<PullResponse> {
        self.post(self.endpoint(&["pull"])?, target).await
    }

    async fn list_tables(&self, token: &DatabaseSnapshotToken) -> BridgeResult<Vec<String>> {
        self.get(self.endpoint(&["tables", token.as_str()])?).await
    }

    async fn read_table(
        &self,
        token: &DatabaseSnapshotToken,
        table_name: &str,
        limit: u64,
        offset: u64,
    ) -> BridgeResult<TablePage> {
        let mut url = self.endpoint(&["table", token.as_str(), table_name])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        self.get(url).await
    }

    async fn execute_query(
        &self,
        token: &DatabaseSnapshotToken,
        query: &str,
    ) -> BridgeResult<QueryResponse> {
        let url = self.endpoint(&["query", token.as_str()])?;
        self.post(url, &QueryRequest { query }).await
    }
}
