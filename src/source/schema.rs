//! Source distribution document.
//!
//! Mirrors the field names of a CloudFront distribution dump. Only the fields
//! the compiler consumes are modelled; everything else is ignored on input.

use serde::{Deserialize, Serialize};

/// Root of the distribution document posted to the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct DistributionConfig {
    /// Informational; not used by the compiler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_id: Option<String>,

    #[serde(default)]
    pub origins: Vec<Origin>,

    /// Expected to hold exactly one behavior.
    #[serde(default)]
    pub default_cache_behavior: Vec<CacheBehavior>,

    /// Path-scoped behaviors. Array position is match priority.
    #[serde(default)]
    pub additional_cache_behaviors: Vec<CacheBehavior>,
}

/// An origin server the distribution can forward to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Origin {
    pub id: String,

    pub domain_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_protocol_policy: Option<ProtocolPolicy>,

    /// Connect timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_origin_config: Option<CustomOriginConfig>,

    #[serde(default, rename = "S3OriginConfig", skip_serializing_if = "Option::is_none")]
    pub s3_origin_config: Option<S3OriginConfig>,
}

impl Origin {
    /// Protocol policy from the origin itself, else from its custom block.
    pub fn protocol_policy(&self) -> ProtocolPolicy {
        self.origin_protocol_policy
            .clone()
            .or_else(|| {
                self.custom_origin_config
                    .as_ref()
                    .and_then(|c| c.origin_protocol_policy.clone())
            })
            .unwrap_or(ProtocolPolicy::Other(String::new()))
    }
}

/// Protocol used to reach an origin. Only `http-only` changes behavior.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ProtocolPolicy {
    HttpOnly,
    Other(String),
}

impl ProtocolPolicy {
    pub fn is_http_only(&self) -> bool {
        matches!(self, ProtocolPolicy::HttpOnly)
    }
}

impl From<String> for ProtocolPolicy {
    fn from(value: String) -> Self {
        match value.as_str() {
            "http-only" => ProtocolPolicy::HttpOnly,
            _ => ProtocolPolicy::Other(value),
        }
    }
}

impl From<ProtocolPolicy> for String {
    fn from(value: ProtocolPolicy) -> Self {
        match value {
            ProtocolPolicy::HttpOnly => "http-only".to_string(),
            ProtocolPolicy::Other(v) => v,
        }
    }
}

/// Overrides for a custom HTTP origin.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct CustomOriginConfig {
    #[serde(default, rename = "HTTPPort", skip_serializing_if = "Option::is_none")]
    pub http_port: Option<u16>,

    #[serde(default, rename = "HTTPSPort", skip_serializing_if = "Option::is_none")]
    pub https_port: Option<u16>,

    /// Read timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_read_timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_protocol_policy: Option<ProtocolPolicy>,
}

/// Overrides for an object-storage origin.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct S3OriginConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_read_timeout: Option<u64>,
}

/// A default or path-scoped cache behavior.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct CacheBehavior {
    /// Absent on the default behavior.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_origin_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_policy: Option<CachePolicy>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CachePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub cache_policy_config: CachePolicyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CachePolicyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "DefaultTTL")]
    pub default_ttl: u64,

    #[serde(rename = "MaxTTL")]
    pub max_ttl: u64,

    #[serde(default, rename = "MinTTL", skip_serializing_if = "Option::is_none")]
    pub min_ttl: Option<u64>,

    #[serde(default)]
    pub parameters_in_cache_key_and_forwarded_to_origin: CacheKeyParameters,
}

impl CachePolicyConfig {
    pub fn query_string_behavior(&self) -> &QueryStringBehavior {
        &self
            .parameters_in_cache_key_and_forwarded_to_origin
            .query_strings_config
            .query_string_behavior
    }

    pub fn headers_config(&self) -> &HeadersConfig {
        &self.parameters_in_cache_key_and_forwarded_to_origin.headers_config
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct CacheKeyParameters {
    #[serde(default)]
    pub query_strings_config: QueryStringsConfig,

    #[serde(default)]
    pub headers_config: HeadersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct QueryStringsConfig {
    #[serde(default)]
    pub query_string_behavior: QueryStringBehavior,
}

/// How the query string participates in the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(from = "String", into = "String")]
pub enum QueryStringBehavior {
    /// Path only.
    #[default]
    None,
    /// Full URL including the query string.
    All,
    /// Any value without defined semantics (`whitelist`, `allExcept`, ...).
    Unsupported(String),
}

impl From<String> for QueryStringBehavior {
    fn from(value: String) -> Self {
        match value.as_str() {
            "none" => QueryStringBehavior::None,
            "all" => QueryStringBehavior::All,
            _ => QueryStringBehavior::Unsupported(value),
        }
    }
}

impl From<QueryStringBehavior> for String {
    fn from(value: QueryStringBehavior) -> Self {
        match value {
            QueryStringBehavior::None => "none".to_string(),
            QueryStringBehavior::All => "all".to_string(),
            QueryStringBehavior::Unsupported(v) => v,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct HeadersConfig {
    #[serde(default)]
    pub header_behavior: HeaderBehavior,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HeaderList>,
}

impl HeadersConfig {
    /// Listed header names, in source order.
    pub fn items(&self) -> &[String] {
        self.headers
            .as_ref()
            .and_then(|h| h.items.as_deref())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct HeaderList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
}

/// How request headers participate in the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(from = "String", into = "String")]
pub enum HeaderBehavior {
    Whitelist,
    #[default]
    NoHeaders,
    Unsupported(String),
}

impl From<String> for HeaderBehavior {
    fn from(value: String) -> Self {
        match value.as_str() {
            "whitelist" => HeaderBehavior::Whitelist,
            "none" => HeaderBehavior::NoHeaders,
            _ => HeaderBehavior::Unsupported(value),
        }
    }
}

impl From<HeaderBehavior> for String {
    fn from(value: HeaderBehavior) -> Self {
        match value {
            HeaderBehavior::Whitelist => "whitelist".to_string(),
            HeaderBehavior::NoHeaders => "none".to_string(),
            HeaderBehavior::Unsupported(v) => v,
        }
    }
}
