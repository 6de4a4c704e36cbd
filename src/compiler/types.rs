//! Compiler options and error definitions.

use thiserror::Error;

/// Knobs that change how lenient the compiler is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Fail on query-string or header behaviors without defined semantics
    /// instead of compiling them to an empty hash term.
    pub strict_policy_values: bool,
}

impl CompileOptions {
    pub fn strict() -> Self {
        Self {
            strict_policy_values: true,
        }
    }
}

/// Whether a behavior is the distribution default or a path-scoped override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorScope {
    Default,
    /// Path-scoped behavior at the given array position.
    Path(usize),
}

impl std::fmt::Display for BehaviorScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BehaviorScope::Default => write!(f, "default behavior"),
            BehaviorScope::Path(idx) => write!(f, "additional behavior #{}", idx),
        }
    }
}

/// Policy field carrying an unsupported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyField {
    QueryStringBehavior,
    HeaderBehavior,
}

impl std::fmt::Display for PolicyField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyField::QueryStringBehavior => write!(f, "QueryStringBehavior"),
            PolicyField::HeaderBehavior => write!(f, "HeaderBehavior"),
        }
    }
}

/// Errors that can occur while compiling a distribution.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid service id '{0}'")]
    InvalidServiceId(String),

    #[error("DefaultCacheBehavior is empty")]
    MissingDefaultBehavior,

    #[error("DefaultCacheBehavior holds {0} behaviors, expected exactly one")]
    MultipleDefaultBehaviors(usize),

    #[error("{0} has no TargetOriginId")]
    MissingTargetOrigin(BehaviorScope),

    #[error("{0} has no PathPattern")]
    MissingPathPattern(BehaviorScope),

    #[error("{scope} targets unknown origin '{origin_id}'")]
    UnknownOrigin {
        scope: BehaviorScope,
        origin_id: String,
    },

    #[error("origin '{origin_id}' is invalid: {reason}")]
    InvalidOrigin { origin_id: String, reason: String },

    #[error("origins '{first}' and '{second}' both compile to backend '{name}'")]
    BackendNameCollision {
        first: String,
        second: String,
        name: String,
    },

    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPathPattern { pattern: String, reason: String },

    #[error("{scope} whitelists invalid header name '{header}'")]
    InvalidHeaderName { scope: BehaviorScope, header: String },

    #[error("{scope} uses unsupported {field} '{value}'")]
    UnsupportedPolicyValue {
        scope: BehaviorScope,
        field: PolicyField,
        value: String,
    },
}

/// Result type for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;
