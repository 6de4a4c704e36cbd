//! Shared fixtures for integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SERVICE_ID: &str = "svc123";
pub const API_KEY: &str = "test-key";
pub const ACTIVE_VERSION: u32 = 2;
pub const DRAFT_VERSION: u32 = 3;

pub const SNIPPET_NAMES: [&str; 5] = ["origins", "recv", "parse", "fetch", "hash"];

/// Two origins, a cached default and two path-scoped behaviors.
pub fn distribution_document() -> Value {
    json!({
        "DistributionId": "E2EXAMPLE",
        "Origins": [
            {
                "Id": "web-origin",
                "DomainName": "www.example.com",
                "OriginProtocolPolicy": "match-viewer",
                "CustomOriginConfig": { "HTTPPort": 80, "HTTPSPort": 443, "OriginReadTimeout": 30 }
            },
            {
                "Id": "assets.example.s3",
                "DomainName": "assets.example.s3.amazonaws.com",
                "S3OriginConfig": { "OriginReadTimeout": 20 }
            }
        ],
        "DefaultCacheBehavior": [{
            "TargetOriginId": "web-origin",
            "CachePolicy": { "CachePolicyConfig": {
                "DefaultTTL": 300,
                "MaxTTL": 86400,
                "ParametersInCacheKeyAndForwardedToOrigin": {
                    "QueryStringsConfig": { "QueryStringBehavior": "all" },
                    "HeadersConfig": {
                        "HeaderBehavior": "whitelist",
                        "Headers": { "Quantity": 1, "Items": ["Accept-Language"] }
                    }
                }
            }}
        }],
        "AdditionalCacheBehaviors": [
            {
                "PathPattern": "/static/*",
                "TargetOriginId": "assets.example.s3",
                "CachePolicy": { "CachePolicyConfig": {
                    "DefaultTTL": 3600,
                    "MaxTTL": 86400,
                    "ParametersInCacheKeyAndForwardedToOrigin": {
                        "QueryStringsConfig": { "QueryStringBehavior": "none" },
                        "HeadersConfig": { "HeaderBehavior": "none" }
                    }
                }}
            },
            {
                "PathPattern": "/api/login",
                "TargetOriginId": "web-origin",
                "CachePolicy": { "CachePolicyConfig": { "DefaultTTL": 0, "MaxTTL": 0 } }
            }
        ]
    })
}

/// Platform API fake serving one service with an active version.
pub struct PlatformMock {
    pub server: MockServer,
}

impl PlatformMock {
    /// Happy path: discover, clone, clear, populate and activate all
    /// succeed. Deleting `hash` reports 404 as if it never existed.
    pub async fn start() -> Self {
        let mock = Self::start_with_versions(json!([
            { "number": 1, "active": false },
            { "number": ACTIVE_VERSION, "active": true }
        ]))
        .await;

        Mock::given(method("PUT"))
            .and(path(format!("/service/{SERVICE_ID}/version/{ACTIVE_VERSION}/clone")))
            .and(header("Fastly-Key", API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "number": DRAFT_VERSION })))
            .mount(&mock.server)
            .await;

        for name in SNIPPET_NAMES {
            let status = if name == "hash" { 404 } else { 200 };
            Mock::given(method("DELETE"))
                .and(path(format!("/service/{SERVICE_ID}/version/{DRAFT_VERSION}/snippet/{name}")))
                .and(header("Fastly-Key", API_KEY))
                .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "status": "ok" })))
                .mount(&mock.server)
                .await;
        }

        Mock::given(method("POST"))
            .and(path(format!("/service/{SERVICE_ID}/version/{DRAFT_VERSION}/snippet")))
            .and(header("Fastly-Key", API_KEY))
            .and(body_partial_json(json!({ "dynamic": 0 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "snippet" })))
            .mount(&mock.server)
            .await;

        mock
    }

    /// Only the version listing is mounted.
    pub async fn start_with_versions(versions: Value) -> Self {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/service/{SERVICE_ID}")))
            .and(header("Fastly-Key", API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": SERVICE_ID,
                "versions": versions
            })))
            .mount(&server)
            .await;

        Self { server }
    }

    /// Expect activation of the draft exactly `times` times.
    pub async fn expect_activation(&self, times: u64) {
        Mock::given(method("PUT"))
            .and(path(format!("/service/{SERVICE_ID}/version/{DRAFT_VERSION}/activate")))
            .and(header("Fastly-Key", API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Make the deletion of one snippet fail with the given status.
    pub async fn fail_delete(&self, name: &str, status: u16) {
        Mock::given(method("DELETE"))
            .and(path(format!("/service/{SERVICE_ID}/version/{DRAFT_VERSION}/snippet/{name}")))
            .respond_with(ResponseTemplate::new(status).set_body_string("Internal error"))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Make the upload of one snippet fail with the given status.
    pub async fn fail_upload(&self, name: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(format!("/service/{SERVICE_ID}/version/{DRAFT_VERSION}/snippet")))
            .and(body_partial_json(json!({ "name": name })))
            .respond_with(ResponseTemplate::new(status).set_body_string("Syntax error"))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    pub fn url(&self) -> url::Url {
        url::Url::parse(&self.server.uri()).unwrap()
    }

    /// Requests received so far with the given method.
    pub async fn count(&self, http_method: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == http_method)
            .count()
    }
}
