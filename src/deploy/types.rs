//! Deployment types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snippet::SnippetName;

/// One version entry of a platform service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceVersion {
    pub number: u32,
    #[serde(default)]
    pub active: bool,
}

/// Steps of the deployment sequence, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStep {
    Discover,
    Clone,
    Clear,
    Populate,
    Activate,
}

impl DeployStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployStep::Discover => "discover",
            DeployStep::Clone => "clone",
            DeployStep::Clear => "clear",
            DeployStep::Populate => "populate",
            DeployStep::Activate => "activate",
        }
    }
}

impl std::fmt::Display for DeployStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from a single platform API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS or timeout failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status from the platform.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not have the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Errors that abort a deployment. Each names the failing step.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("failed to list versions of service {service_id}: {source}")]
    DiscoveryFailed {
        service_id: String,
        #[source]
        source: ApiError,
    },

    #[error("service {service_id} has no active version")]
    NoActiveVersion { service_id: String },

    #[error("failed to clone version {version}: {source}")]
    CloneFailed {
        version: u32,
        #[source]
        source: ApiError,
    },

    #[error("failed to clear snippet '{artifact}' on draft version {draft}: {source}")]
    ArtifactClearFailed {
        draft: u32,
        artifact: SnippetName,
        #[source]
        source: ApiError,
    },

    #[error("failed to upload snippet '{artifact}' to draft version {draft}: {source}")]
    ArtifactUploadFailed {
        draft: u32,
        artifact: SnippetName,
        #[source]
        source: ApiError,
    },

    #[error("failed to activate draft version {draft}: {source}")]
    ActivationFailed {
        draft: u32,
        #[source]
        source: ApiError,
    },

    /// A step finished without reporting a result for every artifact.
    #[error("{step} step on draft version {draft} reported no result for snippet '{artifact}'")]
    IncompleteStep {
        step: DeployStep,
        draft: u32,
        artifact: SnippetName,
    },

    #[error("cannot apply {step} result in phase {phase}")]
    InvalidTransition {
        step: DeployStep,
        phase: &'static str,
    },
}

impl DeployError {
    /// The step that failed.
    pub fn step(&self) -> DeployStep {
        match self {
            DeployError::DiscoveryFailed { .. } | DeployError::NoActiveVersion { .. } => {
                DeployStep::Discover
            }
            DeployError::CloneFailed { .. } => DeployStep::Clone,
            DeployError::ArtifactClearFailed { .. } => DeployStep::Clear,
            DeployError::ArtifactUploadFailed { .. } => DeployStep::Populate,
            DeployError::ActivationFailed { .. } => DeployStep::Activate,
            DeployError::IncompleteStep { step, .. } | DeployError::InvalidTransition { step, .. } => *step,
        }
    }

    /// The artifact the failure concerns, if any.
    pub fn artifact(&self) -> Option<SnippetName> {
        match self {
            DeployError::ArtifactClearFailed { artifact, .. }
            | DeployError::ArtifactUploadFailed { artifact, .. }
            | DeployError::IncompleteStep { artifact, .. } => Some(*artifact),
            _ => None,
        }
    }

    /// Draft version left behind on the platform, if one was created.
    pub fn draft_version(&self) -> Option<u32> {
        match self {
            DeployError::ArtifactClearFailed { draft, .. }
            | DeployError::ArtifactUploadFailed { draft, .. }
            | DeployError::ActivationFailed { draft, .. }
            | DeployError::IncompleteStep { draft, .. } => Some(*draft),
            _ => None,
        }
    }
}

/// Result type for deployment operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// Summary of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub service_id: String,
    /// Version that was active before the deploy.
    pub previous_version: u32,
    /// Draft version that is now active.
    pub activated_version: u32,
    pub snippets: Vec<SnippetName>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_reporting() {
        let err = DeployError::ArtifactUploadFailed {
            draft: 7,
            artifact: SnippetName::Parse,
            source: ApiError::Status { status: 400, body: "bad vcl".into() },
        };
        assert_eq!(err.step(), DeployStep::Populate);
        assert_eq!(err.artifact(), Some(SnippetName::Parse));
        assert_eq!(err.draft_version(), Some(7));
        assert_eq!(
            err.to_string(),
            "failed to upload snippet 'parse' to draft version 7: unexpected status 400: bad vcl"
        );

        let err = DeployError::IncompleteStep {
            step: DeployStep::Clear,
            draft: 5,
            artifact: SnippetName::Hash,
        };
        assert_eq!(err.step(), DeployStep::Clear);
        assert_eq!(err.draft_version(), Some(5));
        assert_eq!(err.to_string(), "clear step on draft version 5 reported no result for snippet 'hash'");

        let err = DeployError::NoActiveVersion { service_id: "svc".into() };
        assert_eq!(err.step(), DeployStep::Discover);
        assert_eq!(err.artifact(), None);
        assert_eq!(err.draft_version(), None);
    }

    #[test]
    fn test_version_list_parsing() {
        let versions: Vec<ServiceVersion> =
            serde_json::from_str(r#"[{"number":1,"active":false},{"number":2,"active":true},{"number":3}]"#)
                .unwrap();
        assert_eq!(versions[1], ServiceVersion { number: 2, active: true });
        assert!(!versions[2].active);
    }
}
