//! Cache key and TTL derivation.
//!
//! # Responsibilities
//! - Decide between bypass and a cached TTL for a behavior
//! - Derive the ordered hash-term sequence that forms the cache key
//!
//! # Design Decisions
//! - Query-string term first, then headers in source order; the order is
//!   part of the cache key and must not change between deploys
//! - A bypassed behavior carries no hash terms
//! - Unsupported enumerants are an explicit branch: warn and skip, or fail
//!   in strict mode

use crate::compiler::types::{
    BehaviorScope, CompileError, CompileOptions, CompileResult, PolicyField,
};
use crate::source::{CachePolicy, HeaderBehavior, QueryStringBehavior};

/// One component of the cache key, concatenated in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashTerm {
    /// URL path without the query string.
    PathOnly,
    /// URL path and query string.
    FullUrl,
    /// Value of a request header.
    Header(String),
}

/// Caching outcome for one behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    /// Never cached; the request is passed to the origin.
    Bypass,
    /// Cached for `ttl_seconds` under a key built from `hash`.
    Cache { ttl_seconds: u64, hash: Vec<HashTerm> },
}

impl CacheDecision {
    pub fn is_bypass(&self) -> bool {
        matches!(self, CacheDecision::Bypass)
    }

    /// TTL to signal to the fetch stage; zero for bypass.
    pub fn ttl_seconds(&self) -> u64 {
        match self {
            CacheDecision::Bypass => 0,
            CacheDecision::Cache { ttl_seconds, .. } => *ttl_seconds,
        }
    }

    pub fn hash_terms(&self) -> &[HashTerm] {
        match self {
            CacheDecision::Bypass => &[],
            CacheDecision::Cache { hash, .. } => hash,
        }
    }
}

/// Derive the cache decision for a behavior's (optional) policy.
pub fn compile_cache_key(
    policy: Option<&CachePolicy>,
    scope: BehaviorScope,
    options: &CompileOptions,
) -> CompileResult<CacheDecision> {
    let config = match policy {
        Some(p) => &p.cache_policy_config,
        None => return Ok(CacheDecision::Bypass),
    };

    if config.max_ttl == 0 {
        return Ok(CacheDecision::Bypass);
    }

    let mut hash = Vec::new();

    match config.query_string_behavior() {
        QueryStringBehavior::None => hash.push(HashTerm::PathOnly),
        QueryStringBehavior::All => hash.push(HashTerm::FullUrl),
        QueryStringBehavior::Unsupported(value) => {
            unsupported(scope, PolicyField::QueryStringBehavior, value, options)?
        }
    }

    let headers = config.headers_config();
    match &headers.header_behavior {
        HeaderBehavior::Whitelist => {
            for name in headers.items() {
                if !is_header_token(name) {
                    return Err(CompileError::InvalidHeaderName {
                        scope,
                        header: name.clone(),
                    });
                }
                hash.push(HashTerm::Header(name.clone()));
            }
        }
        HeaderBehavior::NoHeaders => {}
        HeaderBehavior::Unsupported(value) => {
            unsupported(scope, PolicyField::HeaderBehavior, value, options)?
        }
    }

    Ok(CacheDecision::Cache {
        ttl_seconds: config.default_ttl,
        hash,
    })
}

fn unsupported(
    scope: BehaviorScope,
    field: PolicyField,
    value: &str,
    options: &CompileOptions,
) -> CompileResult<()> {
    if options.strict_policy_values {
        return Err(CompileError::UnsupportedPolicyValue {
            scope,
            field,
            value: value.to_string(),
        });
    }

    tracing::warn!(
        scope = %scope,
        field = %field,
        value = %value,
        "Unsupported cache policy value, no hash term emitted"
    );
    Ok(())
}

/// RFC 7230 token characters; anything else cannot follow `req.http.`.
fn is_header_token(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
        })
}
