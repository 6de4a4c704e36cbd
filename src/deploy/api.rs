//! Platform versioned-configuration API.
//!
//! # Responsibilities
//! - Define the capability the orchestrator drives (`PlatformApi`)
//! - Implement it over HTTP with a per-request credential
//! - Map platform responses to `ApiError`
//!
//! # Design Decisions
//! - Deleting a snippet that does not exist is a success
//! - The credential is never logged

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::deploy::types::{ApiError, ServiceVersion};
use crate::snippet::{Snippet, SnippetName};

/// Header carrying the deployment credential.
pub const API_KEY_HEADER: &str = "Fastly-Key";

/// Deployment credential. `Debug` output is redacted.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Operations the deployment sequence needs from the platform.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// All versions of a service with their active flags.
    async fn service_versions(&self, service_id: &str) -> Result<Vec<ServiceVersion>, ApiError>;

    /// Clone a version; returns the new (inactive) version number.
    async fn clone_version(&self, service_id: &str, version: u32) -> Result<u32, ApiError>;

    /// Delete a snippet by name. Missing snippets count as deleted.
    async fn delete_snippet(
        &self,
        service_id: &str,
        version: u32,
        name: SnippetName,
    ) -> Result<(), ApiError>;

    async fn create_snippet(
        &self,
        service_id: &str,
        version: u32,
        snippet: &Snippet,
    ) -> Result<(), ApiError>;

    async fn activate_version(&self, service_id: &str, version: u32) -> Result<(), ApiError>;
}

#[derive(Deserialize)]
struct ServiceDetails {
    #[serde(default)]
    versions: Vec<ServiceVersion>,
}

#[derive(Deserialize)]
struct VersionNumber {
    number: u32,
}

#[derive(Serialize)]
struct SnippetPayload<'a> {
    name: &'a str,
    dynamic: u8,
    #[serde(rename = "type")]
    snippet_type: &'a str,
    content: String,
}

/// HTTP client for the platform API.
#[derive(Debug, Clone)]
pub struct FastlyApi {
    client: Client,
    base_url: Url,
    key: ApiKey,
}

impl FastlyApi {
    pub fn new(client: Client, base_url: Url, key: ApiKey) -> Self {
        Self {
            client,
            base_url,
            key,
        }
    }

    /// `base_url` + path segments, each percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .header(API_KEY_HEADER, self.key.expose())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        Ok(response)
    }

    async fn expect_success(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl PlatformApi for FastlyApi {
    async fn service_versions(&self, service_id: &str) -> Result<Vec<ServiceVersion>, ApiError> {
        let url = self.url(&["service", service_id])?;
        let response = Self::expect_success(self.send(self.client.get(url)).await?).await?;
        let details: ServiceDetails = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(details.versions)
    }

    async fn clone_version(&self, service_id: &str, version: u32) -> Result<u32, ApiError> {
        let version = version.to_string();
        let url = self.url(&["service", service_id, "version", &version, "clone"])?;
        let response = Self::expect_success(self.send(self.client.put(url)).await?).await?;
        let cloned: VersionNumber = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(cloned.number)
    }

    async fn delete_snippet(
        &self,
        service_id: &str,
        version: u32,
        name: SnippetName,
    ) -> Result<(), ApiError> {
        let version = version.to_string();
        let url = self.url(&["service", service_id, "version", &version, "snippet", name.as_str()])?;
        let response = self.send(self.client.delete(url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(snippet = %name, "Snippet not present on draft, nothing to delete");
            return Ok(());
        }
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn create_snippet(
        &self,
        service_id: &str,
        version: u32,
        snippet: &Snippet,
    ) -> Result<(), ApiError> {
        let version = version.to_string();
        let url = self.url(&["service", service_id, "version", &version, "snippet"])?;
        let payload = SnippetPayload {
            name: snippet.name.as_str(),
            dynamic: 0,
            snippet_type: snippet.snippet_type().as_str(),
            content: snippet.content(),
        };
        let response = self.send(self.client.post(url).json(&payload)).await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn activate_version(&self, service_id: &str, version: u32) -> Result<(), ApiError> {
        let version = version.to_string();
        let url = self.url(&["service", service_id, "version", &version, "activate"])?;
        let response = self.send(self.client.put(url)).await?;
        Self::expect_success(response).await?;
        Ok(())
    }
}
