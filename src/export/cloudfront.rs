//! CloudFront API access through the AWS SDK.
//!
//! Credentials and region come from the standard AWS provider chain.

use async_trait::async_trait;
use aws_sdk_cloudfront::error::DisplayErrorContext;
use aws_sdk_cloudfront::types as cf;
use aws_sdk_cloudfront::Client;

use crate::export::exporter::DistributionSource;
use crate::export::types::{BehaviorRef, DistributionSettings, ExportError, ExportResult, PolicyKind};
use crate::source::schema::{
    CacheKeyParameters, CachePolicy, CachePolicyConfig, CustomOriginConfig, HeaderList, HeadersConfig,
    Origin, ProtocolPolicy, QueryStringsConfig, S3OriginConfig,
};

/// CloudFront applies these when a policy leaves the TTL unset.
const DEFAULT_TTL_SECS: u64 = 86_400;
const MAX_TTL_SECS: u64 = 31_536_000;

/// `DistributionSource` backed by the CloudFront API.
#[derive(Debug, Clone)]
pub struct CloudFrontSource {
    client: Client,
}

impl CloudFrontSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client configured from the environment.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }
}

fn api_error<E>(operation: &'static str) -> impl FnOnce(E) -> ExportError
where
    E: std::error::Error,
{
    move |err| ExportError::Api {
        operation,
        message: DisplayErrorContext(&err).to_string(),
    }
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn convert_origin(origin: &cf::Origin) -> Origin {
    let custom_origin_config = origin.custom_origin_config().map(|c| CustomOriginConfig {
        http_port: u16::try_from(c.http_port()).ok(),
        https_port: u16::try_from(c.https_port()).ok(),
        origin_read_timeout: c.origin_read_timeout().map(|t| non_negative(t.into())),
        origin_protocol_policy: Some(ProtocolPolicy::from(c.origin_protocol_policy().as_str().to_string())),
    });

    Origin {
        id: origin.id().to_string(),
        domain_name: origin.domain_name().to_string(),
        origin_protocol_policy: None,
        connection_timeout: origin.connection_timeout().map(|t| non_negative(t.into())),
        custom_origin_config,
        s3_origin_config: origin.s3_origin_config().map(|_| S3OriginConfig::default()),
    }
}

fn convert_cache_policy(policy: &cf::CachePolicy) -> ExportResult<CachePolicy> {
    let config = policy.cache_policy_config().ok_or(ExportError::MissingField {
        operation: "GetCachePolicy",
        field: "CachePolicyConfig",
    })?;

    let mut parameters = CacheKeyParameters::default();
    if let Some(params) = config.parameters_in_cache_key_and_forwarded_to_origin() {
        if let Some(query) = params.query_strings_config() {
            parameters.query_strings_config = QueryStringsConfig {
                query_string_behavior: query.query_string_behavior().as_str().to_string().into(),
            };
        }
        if let Some(headers) = params.headers_config() {
            parameters.headers_config = HeadersConfig {
                header_behavior: headers.header_behavior().as_str().to_string().into(),
                headers: headers.headers().map(|list| HeaderList {
                    quantity: u32::try_from(list.quantity()).ok(),
                    items: Some(list.items().to_vec()),
                }),
            };
        }
    }

    Ok(CachePolicy {
        id: Some(policy.id().to_string()),
        cache_policy_config: CachePolicyConfig {
            name: Some(config.name().to_string()),
            default_ttl: config.default_ttl().map(non_negative).unwrap_or(DEFAULT_TTL_SECS),
            max_ttl: config.max_ttl().map(non_negative).unwrap_or(MAX_TTL_SECS),
            min_ttl: Some(non_negative(config.min_ttl())),
            parameters_in_cache_key_and_forwarded_to_origin: parameters,
        },
    })
}

#[async_trait]
impl DistributionSource for CloudFrontSource {
    async fn distribution(&self, distribution_id: &str) -> ExportResult<DistributionSettings> {
        const OP: &str = "GetDistributionConfig";

        let output = self
            .client
            .get_distribution_config()
            .id(distribution_id)
            .send()
            .await
            .map_err(api_error(OP))?;
        let config = output.distribution_config().ok_or(ExportError::MissingField {
            operation: OP,
            field: "DistributionConfig",
        })?;
        let default = config.default_cache_behavior().ok_or(ExportError::MissingField {
            operation: OP,
            field: "DefaultCacheBehavior",
        })?;

        let origins: Vec<Origin> = config
            .origins()
            .map(|o| o.items().iter().map(convert_origin).collect())
            .unwrap_or_default();

        let default_behavior = BehaviorRef {
            path_pattern: None,
            target_origin_id: default.target_origin_id().to_string(),
            cache_policy_id: default.cache_policy_id().map(str::to_string),
            origin_request_policy_id: default.origin_request_policy_id().map(str::to_string),
            response_headers_policy_id: default.response_headers_policy_id().map(str::to_string),
        };

        let behaviors: Vec<BehaviorRef> = config
            .cache_behaviors()
            .map(|b| {
                b.items()
                    .iter()
                    .map(|b| BehaviorRef {
                        path_pattern: Some(b.path_pattern().to_string()),
                        target_origin_id: b.target_origin_id().to_string(),
                        cache_policy_id: b.cache_policy_id().map(str::to_string),
                        origin_request_policy_id: b.origin_request_policy_id().map(str::to_string),
                        response_headers_policy_id: b.response_headers_policy_id().map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(DistributionSettings {
            origins,
            default_behavior,
            behaviors,
        })
    }

    async fn cache_policy(&self, policy_id: &str) -> ExportResult<CachePolicy> {
        let output = self
            .client
            .get_cache_policy()
            .id(policy_id)
            .send()
            .await
            .map_err(api_error("GetCachePolicy"))?;
        let policy = output.cache_policy().ok_or(ExportError::MissingField {
            operation: "GetCachePolicy",
            field: "CachePolicy",
        })?;
        convert_cache_policy(policy)
    }

    async fn policy_name(&self, kind: PolicyKind, policy_id: &str) -> ExportResult<String> {
        let name = match kind {
            PolicyKind::Cache => self
                .cache_policy(policy_id)
                .await?
                .cache_policy_config
                .name
                .unwrap_or_default(),
            PolicyKind::OriginRequest => {
                const OP: &str = "GetOriginRequestPolicy";
                let output = self
                    .client
                    .get_origin_request_policy()
                    .id(policy_id)
                    .send()
                    .await
                    .map_err(api_error(OP))?;
                output
                    .origin_request_policy()
                    .and_then(|p| p.origin_request_policy_config())
                    .map(|c| c.name().to_string())
                    .ok_or(ExportError::MissingField {
                        operation: OP,
                        field: "OriginRequestPolicyConfig",
                    })?
            }
            PolicyKind::ResponseHeaders => {
                const OP: &str = "GetResponseHeadersPolicy";
                let output = self
                    .client
                    .get_response_headers_policy()
                    .id(policy_id)
                    .send()
                    .await
                    .map_err(api_error(OP))?;
                output
                    .response_headers_policy()
                    .and_then(|p| p.response_headers_policy_config())
                    .map(|c| c.name().to_string())
                    .ok_or(ExportError::MissingField {
                        operation: OP,
                        field: "ResponseHeadersPolicyConfig",
                    })?
            }
        };
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_origin_conversion() {
        let origin = cf::Origin::builder()
            .id("web-origin")
            .domain_name("www.example.com")
            .connection_timeout(5)
            .custom_origin_config(
                cf::CustomOriginConfig::builder()
                    .http_port(8080)
                    .https_port(443)
                    .origin_protocol_policy(cf::OriginProtocolPolicy::HttpOnly)
                    .origin_read_timeout(20)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let converted = convert_origin(&origin);
        assert_eq!(converted.id, "web-origin");
        assert_eq!(converted.connection_timeout, Some(5));
        assert!(converted.protocol_policy().is_http_only());
        let custom = converted.custom_origin_config.unwrap();
        assert_eq!(custom.http_port, Some(8080));
        assert_eq!(custom.origin_read_timeout, Some(20));
        assert!(converted.s3_origin_config.is_none());
    }

    #[test]
    fn test_cache_policy_conversion() {
        let config = cf::CachePolicyConfig::builder()
            .name("CachingWithLanguage")
            .min_ttl(0)
            .max_ttl(600)
            .parameters_in_cache_key_and_forwarded_to_origin(
                cf::ParametersInCacheKeyAndForwardedToOrigin::builder()
                    .enable_accept_encoding_gzip(true)
                    .query_strings_config(
                        cf::CachePolicyQueryStringsConfig::builder()
                            .query_string_behavior(cf::CachePolicyQueryStringBehavior::All)
                            .build()
                            .unwrap(),
                    )
                    .headers_config(
                        cf::CachePolicyHeadersConfig::builder()
                            .header_behavior(cf::CachePolicyHeaderBehavior::Whitelist)
                            .headers(cf::Headers::builder().quantity(1).items("Accept-Language").build().unwrap())
                            .build()
                            .unwrap(),
                    )
                    .cookies_config(
                        cf::CachePolicyCookiesConfig::builder()
                            .cookie_behavior(cf::CachePolicyCookieBehavior::None)
                            .build()
                            .unwrap(),
                    )
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let policy = cf::CachePolicy::builder()
            .id("cp-1")
            .last_modified_time(aws_sdk_cloudfront::primitives::DateTime::from_secs(0))
            .cache_policy_config(config)
            .build()
            .unwrap();

        let converted = convert_cache_policy(&policy).unwrap();
        let config = &converted.cache_policy_config;
        assert_eq!(config.name.as_deref(), Some("CachingWithLanguage"));
        assert_eq!(config.max_ttl, 600);
        // Unset default TTL falls back to CloudFront's own default.
        assert_eq!(config.default_ttl, DEFAULT_TTL_SECS);
        assert_eq!(config.query_string_behavior(), &crate::source::QueryStringBehavior::All);
        assert_eq!(config.headers_config().items(), ["Accept-Language".to_string()]);
    }
}
