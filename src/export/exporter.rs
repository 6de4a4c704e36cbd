//! Build a distribution document from a live distribution.
//!
//! # Responsibilities
//! - Fetch the distribution's origins and behaviors
//! - Resolve each behavior's cache policy into the document
//! - Collect policy names for the summary table
//!
//! # Design Decisions
//! - A failed cache policy lookup fails the export; a behavior without its
//!   policy would compile as uncached
//! - Origin-request and response-headers policies only feed the summary and
//!   are looked up only when a summary is requested

use async_trait::async_trait;

use crate::export::types::{
    BehaviorRef, DistributionSettings, ExportResult, PolicyKind, SummaryRow,
};
use crate::source::{CacheBehavior, CachePolicy, DistributionConfig};

/// Read access to a CDN distribution and its policies.
#[async_trait]
pub trait DistributionSource: Send + Sync {
    async fn distribution(&self, distribution_id: &str) -> ExportResult<DistributionSettings>;

    async fn cache_policy(&self, policy_id: &str) -> ExportResult<CachePolicy>;

    /// Display name of a policy.
    async fn policy_name(&self, kind: PolicyKind, policy_id: &str) -> ExportResult<String>;
}

/// Output of one export.
#[derive(Debug, Clone)]
pub struct Export {
    pub document: DistributionConfig,
    /// Default behavior first, then the path-scoped ones. Empty unless a
    /// summary was requested.
    pub summary: Vec<SummaryRow>,
}

/// Fetch `distribution_id` and assemble the document the compiler reads.
pub async fn export_distribution<S>(
    source: &S,
    distribution_id: &str,
    with_summary: bool,
) -> ExportResult<Export>
where
    S: DistributionSource + ?Sized,
{
    let settings = source.distribution(distribution_id).await?;
    tracing::info!(
        distribution_id = %distribution_id,
        origins = settings.origins.len(),
        behaviors = settings.behaviors.len() + 1,
        "Fetched distribution"
    );

    let mut summary = Vec::new();
    let default = resolve(source, &settings.default_behavior, with_summary, &mut summary).await?;
    let mut additional = Vec::with_capacity(settings.behaviors.len());
    for behavior in &settings.behaviors {
        additional.push(resolve(source, behavior, with_summary, &mut summary).await?);
    }

    Ok(Export {
        document: DistributionConfig {
            distribution_id: Some(distribution_id.to_string()),
            origins: settings.origins,
            default_cache_behavior: vec![default],
            additional_cache_behaviors: additional,
        },
        summary,
    })
}

async fn resolve<S>(
    source: &S,
    behavior: &BehaviorRef,
    with_summary: bool,
    summary: &mut Vec<SummaryRow>,
) -> ExportResult<CacheBehavior>
where
    S: DistributionSource + ?Sized,
{
    let cache_policy = match behavior.cache_policy_id.as_deref() {
        Some(id) => Some(source.cache_policy(id).await?),
        None => None,
    };

    if with_summary {
        let cache_name = cache_policy
            .as_ref()
            .and_then(|p| p.cache_policy_config.name.clone())
            .unwrap_or_else(|| "None".to_string());
        summary.push(SummaryRow {
            path_pattern: behavior
                .path_pattern
                .clone()
                .unwrap_or_else(|| "Default (*)".to_string()),
            target_origin: behavior.target_origin_id.clone(),
            cache_policy: cache_name,
            origin_request_policy: name_or_none(
                source,
                PolicyKind::OriginRequest,
                behavior.origin_request_policy_id.as_deref(),
            )
            .await,
            response_headers_policy: name_or_none(
                source,
                PolicyKind::ResponseHeaders,
                behavior.response_headers_policy_id.as_deref(),
            )
            .await,
        });
    }

    Ok(CacheBehavior {
        path_pattern: behavior.path_pattern.clone(),
        target_origin_id: Some(behavior.target_origin_id.clone()),
        cache_policy,
    })
}

/// Summary cell for a policy reference. Lookup errors show up in the cell.
async fn name_or_none<S>(source: &S, kind: PolicyKind, id: Option<&str>) -> String
where
    S: DistributionSource + ?Sized,
{
    let Some(id) = id else {
        return "None".to_string();
    };
    match source.policy_name(kind, id).await {
        Ok(name) => name,
        Err(err) => {
            tracing::warn!(policy = kind.as_str(), policy_id = %id, error = %err, "Policy lookup failed");
            format!("error: {}", err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, CompileOptions};
    use crate::export::types::ExportError;
    use crate::source::Origin;

    struct FakeSource;

    fn behavior(path: Option<&str>, origin: &str, cache: Option<&str>) -> BehaviorRef {
        BehaviorRef {
            path_pattern: path.map(str::to_string),
            target_origin_id: origin.to_string(),
            cache_policy_id: cache.map(str::to_string),
            ..Default::default()
        }
    }

    #[async_trait]
    impl DistributionSource for FakeSource {
        async fn distribution(&self, _distribution_id: &str) -> ExportResult<DistributionSettings> {
            let origin: Origin = serde_json::from_value(serde_json::json!({
                "Id": "web", "DomainName": "www.example.com"
            }))
            .unwrap();
            Ok(DistributionSettings {
                origins: vec![origin],
                default_behavior: BehaviorRef {
                    origin_request_policy_id: Some("orp-1".into()),
                    response_headers_policy_id: Some("gone".into()),
                    ..behavior(None, "web", Some("cp-default"))
                },
                behaviors: vec![
                    behavior(Some("/static/*"), "web", Some("cp-static")),
                    behavior(Some("/legacy"), "web", None),
                ],
            })
        }

        async fn cache_policy(&self, policy_id: &str) -> ExportResult<CachePolicy> {
            let ttl = if policy_id == "cp-static" { 3600 } else { 60 };
            Ok(serde_json::from_value(serde_json::json!({
                "Id": policy_id,
                "CachePolicyConfig": { "Name": policy_id, "DefaultTTL": ttl, "MaxTTL": 86400 }
            }))
            .unwrap())
        }

        async fn policy_name(&self, _kind: PolicyKind, policy_id: &str) -> ExportResult<String> {
            if policy_id == "gone" {
                return Err(ExportError::Api {
                    operation: "GetResponseHeadersPolicy",
                    message: "NoSuchResponseHeadersPolicy".into(),
                });
            }
            Ok(format!("name-of-{}", policy_id))
        }
    }

    #[tokio::test]
    async fn test_export_builds_compilable_document() {
        let export = export_distribution(&FakeSource, "E123", false).await.unwrap();
        let doc = &export.document;

        assert_eq!(doc.distribution_id.as_deref(), Some("E123"));
        assert_eq!(doc.default_cache_behavior.len(), 1);
        assert_eq!(doc.additional_cache_behaviors.len(), 2);
        assert_eq!(doc.additional_cache_behaviors[1].path_pattern.as_deref(), Some("/legacy"));
        assert!(doc.additional_cache_behaviors[1].cache_policy.is_none());
        assert!(export.summary.is_empty());

        let compiled = compile(doc, "svc", &CompileOptions::default()).unwrap();
        assert_eq!(compiled.snippets.iter().count(), 5);
    }

    #[tokio::test]
    async fn test_summary_rows() {
        let export = export_distribution(&FakeSource, "E123", true).await.unwrap();
        let rows = export.summary;

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].path_pattern, "Default (*)");
        assert_eq!(rows[0].cache_policy, "cp-default");
        assert_eq!(rows[0].origin_request_policy, "name-of-orp-1");
        assert!(rows[0].response_headers_policy.starts_with("error: "));
        assert_eq!(rows[1].path_pattern, "/static/*");
        assert_eq!(rows[2].cache_policy, "None");
        assert_eq!(rows[2].origin_request_policy, "None");
    }
}
