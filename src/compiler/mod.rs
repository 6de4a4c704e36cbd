//! Configuration compiler subsystem.
//!
//! # Data Flow
//! ```text
//! DistributionConfig
//!     → backend.rs (Origins → Backend[], name collision check)
//!     → routing.rs (DefaultCacheBehavior + AdditionalCacheBehaviors)
//!         → path_pattern.rs (PathPattern → RouteMatch)
//!         → cache_key.rs (CachePolicy → CacheDecision)
//!     → RoutingTable
//!     → snippet::assemble (five artifacts)
//! ```
//!
//! # Design Decisions
//! - Pure functions: same document and options always compile the same way
//! - Nothing compiled is cached across requests
//! - Reject only what cannot be expressed as valid VCL

pub mod backend;
pub mod cache_key;
pub mod path_pattern;
pub mod routing;
pub mod types;

pub use backend::{backend_name, compile_backend, compile_backends, validate_origin, Backend, BackendSet, HealthProbe};
pub use cache_key::{compile_cache_key, CacheDecision, HashTerm};
pub use path_pattern::{compile_path_pattern, RouteMatch};
pub use routing::{build_routing_table, RouteRule, RoutingTable};
pub use types::{BehaviorScope, CompileError, CompileOptions, CompileResult, PolicyField};

use crate::snippet::{assemble, SnippetSet};
use crate::source::DistributionConfig;

/// Output of one compile.
#[derive(Debug, Clone)]
pub struct CompiledDistribution {
    pub backends: BackendSet,
    pub routing: RoutingTable,
    pub snippets: SnippetSet,
}

/// Service ids become URL path segments and a VCL string.
fn validate_service_id(service_id: &str) -> CompileResult<()> {
    let valid = !service_id.is_empty()
        && service_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CompileError::InvalidServiceId(service_id.to_string()))
    }
}

/// Compile a distribution document into the artifact set for a service.
pub fn compile(
    config: &DistributionConfig,
    service_id: &str,
    options: &CompileOptions,
) -> CompileResult<CompiledDistribution> {
    validate_service_id(service_id)?;

    let default = match config.default_cache_behavior.as_slice() {
        [] => return Err(CompileError::MissingDefaultBehavior),
        [single] => single,
        many => return Err(CompileError::MultipleDefaultBehaviors(many.len())),
    };

    let backends = compile_backends(&config.origins)?;
    let routing = build_routing_table(
        default,
        &config.additional_cache_behaviors,
        &backends,
        options,
    )?;
    let snippets = assemble(backends.as_slice(), &routing, service_id);

    tracing::info!(
        service_id = %service_id,
        backends = backends.len(),
        path_rules = routing.path_rules.len(),
        "Distribution compiled"
    );

    Ok(CompiledDistribution {
        backends,
        routing,
        snippets,
    })
}
