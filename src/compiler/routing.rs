//! Routing table assembly and evaluation.
//!
//! # Responsibilities
//! - Compile the default behavior into the fallback rule
//! - Compile path-scoped behaviors into rules, preserving array order
//! - Resolve each rule's backend (own origin or inherited default)
//! - Evaluate a request path against the table
//!
//! # Design Decisions
//! - First match wins, in authored order; no longest-match reordering
//! - A rule without its own origin inherits the default's backend
//! - Unknown origin references are rejected; VCL would not compile them

use crate::compiler::backend::BackendSet;
use crate::compiler::cache_key::{compile_cache_key, CacheDecision};
use crate::compiler::path_pattern::{compile_path_pattern, RouteMatch};
use crate::compiler::types::{BehaviorScope, CompileError, CompileOptions, CompileResult};
use crate::source::CacheBehavior;

/// One compiled behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub scope: BehaviorScope,
    /// Match condition; `None` on the default rule.
    pub route_match: Option<RouteMatch>,
    /// Name of the backend this rule selects.
    pub backend: String,
    pub cache: CacheDecision,
}

/// Ordered decision table: path rules in array order, then the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    pub default_rule: RouteRule,
    pub path_rules: Vec<RouteRule>,
}

impl RoutingTable {
    /// Select the rule a request path is served by.
    pub fn evaluate(&self, path: &str) -> &RouteRule {
        self.path_rules
            .iter()
            .find(|rule| {
                rule.route_match
                    .as_ref()
                    .is_some_and(|m| m.matches(path))
            })
            .unwrap_or(&self.default_rule)
    }
}

fn resolve_backend(
    backends: &BackendSet,
    scope: BehaviorScope,
    origin_id: &str,
) -> CompileResult<String> {
    backends
        .get(origin_id)
        .map(|b| b.name.clone())
        .ok_or_else(|| CompileError::UnknownOrigin {
            scope,
            origin_id: origin_id.to_string(),
        })
}

/// Build the routing table from the default and path-scoped behaviors.
pub fn build_routing_table(
    default: &CacheBehavior,
    additional: &[CacheBehavior],
    backends: &BackendSet,
    options: &CompileOptions,
) -> CompileResult<RoutingTable> {
    let scope = BehaviorScope::Default;
    let origin_id = default
        .target_origin_id
        .as_deref()
        .ok_or(CompileError::MissingTargetOrigin(scope))?;

    let default_rule = RouteRule {
        scope,
        route_match: None,
        backend: resolve_backend(backends, scope, origin_id)?,
        cache: compile_cache_key(default.cache_policy.as_ref(), scope, options)?,
    };

    let mut path_rules = Vec::with_capacity(additional.len());
    for (idx, behavior) in additional.iter().enumerate() {
        let scope = BehaviorScope::Path(idx);

        let pattern = behavior
            .path_pattern
            .as_deref()
            .ok_or(CompileError::MissingPathPattern(scope))?;

        let backend = match behavior.target_origin_id.as_deref() {
            Some(origin_id) => resolve_backend(backends, scope, origin_id)?,
            None => default_rule.backend.clone(),
        };

        let rule = RouteRule {
            scope,
            route_match: Some(compile_path_pattern(pattern)?),
            backend,
            cache: compile_cache_key(behavior.cache_policy.as_ref(), scope, options)?,
        };

        tracing::debug!(
            index = idx,
            pattern = %pattern,
            backend = %rule.backend,
            bypass = rule.cache.is_bypass(),
            "Compiled path rule"
        );
        path_rules.push(rule);
    }

    Ok(RoutingTable {
        default_rule,
        path_rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::backend::compile_backends;
    use crate::compiler::cache_key::HashTerm;
    use crate::source::Origin;

    fn backends(ids: &[&str]) -> BackendSet {
        let origins: Vec<Origin> = ids
            .iter()
            .map(|id| {
                serde_json::from_value(serde_json::json!({
                    "Id": id, "DomainName": format!("{}.example.com", id)
                }))
                .unwrap()
            })
            .collect();
        compile_backends(&origins).unwrap()
    }

    fn behavior(json: serde_json::Value) -> CacheBehavior {
        serde_json::from_value(json).unwrap()
    }

    fn cached_default() -> CacheBehavior {
        behavior(serde_json::json!({
            "TargetOriginId": "origin-1",
            "CachePolicy": { "CachePolicyConfig": {
                "DefaultTTL": 60, "MaxTTL": 3600,
                "ParametersInCacheKeyAndForwardedToOrigin": {
                    "QueryStringsConfig": { "QueryStringBehavior": "none" },
                    "HeadersConfig": { "HeaderBehavior": "none" }
                }
            }}
        }))
    }

    #[test]
    fn test_default_only_table() {
        let table = build_routing_table(
            &cached_default(),
            &[],
            &backends(&["origin-1"]),
            &CompileOptions::default(),
        )
        .unwrap();

        assert!(table.path_rules.is_empty());
        assert_eq!(table.default_rule.backend, "F_origin_1");
        assert_eq!(
            table.default_rule.cache,
            CacheDecision::Cache { ttl_seconds: 60, hash: vec![HashTerm::PathOnly] }
        );
        assert_eq!(table.evaluate("/anything"), &table.default_rule);
    }

    #[test]
    fn test_first_match_wins_in_array_order() {
        let additional = vec![
            behavior(serde_json::json!({ "PathPattern": "/api/*", "TargetOriginId": "origin-2" })),
            behavior(serde_json::json!({ "PathPattern": "/api/v1", "TargetOriginId": "origin-3" })),
        ];
        let table = build_routing_table(
            &cached_default(),
            &additional,
            &backends(&["origin-1", "origin-2", "origin-3"]),
            &CompileOptions::default(),
        )
        .unwrap();

        // The more specific exact rule is never reached.
        let rule = table.evaluate("/api/v1");
        assert_eq!(rule.scope, BehaviorScope::Path(0));
        assert_eq!(rule.backend, "F_origin_2");

        assert_eq!(table.evaluate("/static/app.js").scope, BehaviorScope::Default);
    }

    #[test]
    fn test_exact_rule_reached_when_listed_first() {
        let additional = vec![
            behavior(serde_json::json!({ "PathPattern": "/api/v1", "TargetOriginId": "origin-3" })),
            behavior(serde_json::json!({ "PathPattern": "/api/*", "TargetOriginId": "origin-2" })),
        ];
        let table = build_routing_table(
            &cached_default(),
            &additional,
            &backends(&["origin-1", "origin-2", "origin-3"]),
            &CompileOptions::default(),
        )
        .unwrap();

        assert_eq!(table.evaluate("/api/v1").backend, "F_origin_3");
        assert_eq!(table.evaluate("/api/v2").backend, "F_origin_2");
    }

    #[test]
    fn test_rule_inherits_default_backend() {
        let additional = vec![behavior(serde_json::json!({ "PathPattern": "/img/*" }))];
        let table = build_routing_table(
            &cached_default(),
            &additional,
            &backends(&["origin-1"]),
            &CompileOptions::default(),
        )
        .unwrap();

        let rule = &table.path_rules[0];
        assert_eq!(rule.backend, "F_origin_1");
        // No policy on the path rule means bypass.
        assert!(rule.cache.is_bypass());
    }

    #[test]
    fn test_path_rule_zero_max_ttl_overrides_default() {
        let additional = vec![behavior(serde_json::json!({
            "PathPattern": "/live/*",
            "CachePolicy": { "CachePolicyConfig": { "DefaultTTL": 60, "MaxTTL": 0 } }
        }))];
        let table = build_routing_table(
            &cached_default(),
            &additional,
            &backends(&["origin-1"]),
            &CompileOptions::default(),
        )
        .unwrap();

        assert!(!table.default_rule.cache.is_bypass());
        assert!(table.evaluate("/live/stream").cache.is_bypass());
    }

    #[test]
    fn test_unknown_origin_is_rejected() {
        let additional = vec![behavior(serde_json::json!({ "PathPattern": "/a", "TargetOriginId": "nope" }))];
        let err = build_routing_table(
            &cached_default(),
            &additional,
            &backends(&["origin-1"]),
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnknownOrigin { scope: BehaviorScope::Path(0), .. }
        ));
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let set = backends(&["origin-1"]);
        let options = CompileOptions::default();

        let err = build_routing_table(&behavior(serde_json::json!({})), &[], &set, &options).unwrap_err();
        assert!(matches!(err, CompileError::MissingTargetOrigin(BehaviorScope::Default)));

        let additional = vec![behavior(serde_json::json!({ "TargetOriginId": "origin-1" }))];
        let err = build_routing_table(&cached_default(), &additional, &set, &options).unwrap_err();
        assert!(matches!(err, CompileError::MissingPathPattern(BehaviorScope::Path(0))));
    }
}
