//! Backend compilation.
//!
//! # Responsibilities
//! - Normalize one origin into a backend definition
//! - Resolve port and timeouts from the origin's override blocks
//! - Attach the fixed health probe
//! - Derive a VCL-safe backend identifier from the origin id
//! - Reject origin ids and domain names that cannot be written into VCL

use std::collections::HashMap;

use crate::compiler::types::{CompileError, CompileResult};
use crate::source::Origin;

/// Prefix that makes every backend name a valid VCL identifier.
pub const BACKEND_NAME_PREFIX: &str = "F_";

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const HTTP_PORT: u16 = 80;
pub const HTTPS_PORT: u16 = 443;

/// Connection cap written into every backend declaration.
pub const MAX_CONNECTIONS: u32 = 200;

/// Active health probe attached to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthProbe {
    pub method: &'static str,
    pub path: &'static str,
    pub host: String,
    pub timeout_secs: u64,
    pub window: u32,
    pub threshold: u32,
    pub initial: u32,
}

impl HealthProbe {
    /// The probe shared by every backend: `HEAD /` against the origin host.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            method: "HEAD",
            path: "/",
            host: host.into(),
            timeout_secs: 2,
            window: 5,
            threshold: 1,
            initial: 5,
        }
    }
}

/// A compiled backend definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    /// VCL identifier, derived from the origin id.
    pub name: String,
    /// Origin id this backend was compiled from.
    pub origin_id: String,
    pub host: String,
    pub port: u16,
    pub connect_timeout_secs: u64,
    pub first_byte_timeout_secs: u64,
    pub between_bytes_timeout_secs: u64,
    pub probe: HealthProbe,
}

/// Derive the backend identifier for an origin id.
///
/// Distinct ids that differ only in `.`, `-`, `/` or space map to the same
/// name; [`compile_backends`] rejects such pairs.
pub fn backend_name(origin_id: &str) -> String {
    let mut name = String::with_capacity(BACKEND_NAME_PREFIX.len() + origin_id.len());
    name.push_str(BACKEND_NAME_PREFIX);
    name.extend(origin_id.chars().map(|c| match c {
        '.' | '-' | '/' | ' ' => '_',
        other => other,
    }));
    name
}

/// Host name check per RFC 1123: dot-separated labels of letters, digits
/// and inner hyphens.
fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

/// Check that an origin can be declared as a backend.
pub fn validate_origin(origin: &Origin) -> CompileResult<()> {
    let invalid = |reason: String| CompileError::InvalidOrigin {
        origin_id: origin.id.clone(),
        reason,
    };

    let name = backend_name(&origin.id);
    let name_ok = !origin.id.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !name_ok {
        return Err(invalid(format!("id does not form a valid backend name ('{}')", name)));
    }

    if !is_valid_host(&origin.domain_name) {
        return Err(invalid(format!("'{}' is not a valid host name", origin.domain_name.escape_debug())));
    }

    Ok(())
}

/// Compile one origin. Callers validate it first with [`validate_origin`].
pub fn compile_backend(origin: &Origin) -> Backend {
    let http_only = origin.protocol_policy().is_http_only();
    let default_port = if http_only { HTTP_PORT } else { HTTPS_PORT };

    let mut connect = DEFAULT_TIMEOUT_SECS;
    let mut first_byte = DEFAULT_TIMEOUT_SECS;
    let mut between_bytes = DEFAULT_TIMEOUT_SECS;
    let port;

    if let Some(custom) = &origin.custom_origin_config {
        let read = custom.origin_read_timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        connect = read;
        first_byte = read;
        between_bytes = read;
        port = if http_only {
            custom.http_port.unwrap_or(HTTP_PORT)
        } else {
            custom.https_port.unwrap_or(HTTPS_PORT)
        };
    } else if let Some(s3) = &origin.s3_origin_config {
        first_byte = s3.origin_read_timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        port = HTTPS_PORT;
    } else {
        port = default_port;
    }

    if let Some(timeout) = origin.connection_timeout {
        connect = timeout;
    }

    Backend {
        name: backend_name(&origin.id),
        origin_id: origin.id.clone(),
        host: origin.domain_name.clone(),
        port,
        connect_timeout_secs: connect,
        first_byte_timeout_secs: first_byte,
        between_bytes_timeout_secs: between_bytes,
        probe: HealthProbe::for_host(origin.domain_name.clone()),
    }
}

/// All compiled backends of a distribution, addressable by origin id.
#[derive(Debug, Clone, Default)]
pub struct BackendSet {
    backends: Vec<Backend>,
    by_origin: HashMap<String, usize>,
}

impl BackendSet {
    /// Look up the backend compiled from an origin id.
    pub fn get(&self, origin_id: &str) -> Option<&Backend> {
        self.by_origin.get(origin_id).map(|&idx| &self.backends[idx])
    }

    /// Backends in origin declaration order.
    pub fn as_slice(&self) -> &[Backend] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

/// Compile every origin, rejecting invalid origins and backend name
/// collisions.
pub fn compile_backends(origins: &[Origin]) -> CompileResult<BackendSet> {
    let mut set = BackendSet::default();
    let mut by_name: HashMap<String, String> = HashMap::new();

    for origin in origins {
        validate_origin(origin)?;
        let backend = compile_backend(origin);

        if let Some(existing) = by_name.get(&backend.name) {
            if existing == &origin.id {
                tracing::warn!(origin_id = %origin.id, "Duplicate origin id, keeping first declaration");
                continue;
            }
            return Err(CompileError::BackendNameCollision {
                first: existing.clone(),
                second: origin.id.clone(),
                name: backend.name,
            });
        }

        tracing::debug!(
            origin_id = %origin.id,
            backend = %backend.name,
            host = %backend.host,
            port = backend.port,
            "Compiled backend"
        );

        by_name.insert(backend.name.clone(), origin.id.clone());
        set.by_origin.insert(origin.id.clone(), set.backends.len());
        set.backends.push(backend);
    }

    Ok(set)
}
