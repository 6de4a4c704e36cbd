//! Deployment state machine.
//!
//! # Responsibilities
//! - Track which step of the sequence a deploy has reached
//! - Turn each step's API outcome into the next state or an error
//!
//! # Design Decisions
//! - Transitions are pure: (state, API result) → next state
//! - Phases only advance one step at a time; anything else is rejected
//! - Activation is only reachable from `Populated`

use crate::deploy::types::{ApiError, DeployError, DeployResult, DeployStep, ServiceVersion};
use crate::snippet::SnippetName;

/// Progress of one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployPhase {
    Start,
    ActiveVersionFound { active: u32 },
    Cloned { active: u32, draft: u32 },
    Cleared { active: u32, draft: u32 },
    Populated { active: u32, draft: u32 },
    Activated { active: u32, draft: u32 },
}

impl DeployPhase {
    pub fn name(&self) -> &'static str {
        match self {
            DeployPhase::Start => "start",
            DeployPhase::ActiveVersionFound { .. } => "active-version-found",
            DeployPhase::Cloned { .. } => "cloned",
            DeployPhase::Cleared { .. } => "cleared",
            DeployPhase::Populated { .. } => "populated",
            DeployPhase::Activated { .. } => "activated",
        }
    }
}

/// Per-artifact outcomes of a clear or populate step.
pub type ArtifactResults = Vec<(SnippetName, Result<(), ApiError>)>;

/// State of one deploy invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentState {
    service_id: String,
    phase: DeployPhase,
}

impl DeploymentState {
    pub fn new(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            phase: DeployPhase::Start,
        }
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn phase(&self) -> DeployPhase {
        self.phase
    }

    pub fn active_version(&self) -> Option<u32> {
        match self.phase {
            DeployPhase::Start => None,
            DeployPhase::ActiveVersionFound { active }
            | DeployPhase::Cloned { active, .. }
            | DeployPhase::Cleared { active, .. }
            | DeployPhase::Populated { active, .. }
            | DeployPhase::Activated { active, .. } => Some(active),
        }
    }

    pub fn draft_version(&self) -> Option<u32> {
        match self.phase {
            DeployPhase::Start | DeployPhase::ActiveVersionFound { .. } => None,
            DeployPhase::Cloned { draft, .. }
            | DeployPhase::Cleared { draft, .. }
            | DeployPhase::Populated { draft, .. }
            | DeployPhase::Activated { draft, .. } => Some(draft),
        }
    }

    fn advance(self, phase: DeployPhase) -> Self {
        Self { phase, ..self }
    }

    fn invalid(&self, step: DeployStep) -> DeployError {
        DeployError::InvalidTransition {
            step,
            phase: self.phase.name(),
        }
    }

    /// Apply the version listing: `Start → ActiveVersionFound`.
    pub fn discovered(self, result: Result<Vec<ServiceVersion>, ApiError>) -> DeployResult<Self> {
        if self.phase != DeployPhase::Start {
            return Err(self.invalid(DeployStep::Discover));
        }

        let versions = result.map_err(|source| DeployError::DiscoveryFailed {
            service_id: self.service_id.clone(),
            source,
        })?;

        match versions.iter().find(|v| v.active) {
            Some(v) => {
                let active = v.number;
                Ok(self.advance(DeployPhase::ActiveVersionFound { active }))
            }
            None => Err(DeployError::NoActiveVersion {
                service_id: self.service_id,
            }),
        }
    }

    /// Apply the clone result: `ActiveVersionFound → Cloned`.
    pub fn cloned(self, result: Result<u32, ApiError>) -> DeployResult<Self> {
        let active = match self.phase {
            DeployPhase::ActiveVersionFound { active } => active,
            _ => return Err(self.invalid(DeployStep::Clone)),
        };

        let draft = result.map_err(|source| DeployError::CloneFailed {
            version: active,
            source,
        })?;

        // Editing the returned version must never touch live traffic.
        if draft == active {
            return Err(DeployError::CloneFailed {
                version: active,
                source: ApiError::Decode(format!("clone returned the active version {}", active)),
            });
        }

        Ok(self.advance(DeployPhase::Cloned { active, draft }))
    }

    /// Apply the per-artifact deletions: `Cloned → Cleared`.
    pub fn cleared(self, results: ArtifactResults) -> DeployResult<Self> {
        let (active, draft) = match self.phase {
            DeployPhase::Cloned { active, draft } => (active, draft),
            _ => return Err(self.invalid(DeployStep::Clear)),
        };

        check_all_artifacts(DeployStep::Clear, draft, results, |artifact, source| {
            DeployError::ArtifactClearFailed {
                draft,
                artifact,
                source,
            }
        })?;

        Ok(self.advance(DeployPhase::Cleared { active, draft }))
    }

    /// Apply the per-artifact uploads: `Cleared → Populated`.
    pub fn populated(self, results: ArtifactResults) -> DeployResult<Self> {
        let (active, draft) = match self.phase {
            DeployPhase::Cleared { active, draft } => (active, draft),
            _ => return Err(self.invalid(DeployStep::Populate)),
        };

        check_all_artifacts(DeployStep::Populate, draft, results, |artifact, source| {
            DeployError::ArtifactUploadFailed {
                draft,
                artifact,
                source,
            }
        })?;

        Ok(self.advance(DeployPhase::Populated { active, draft }))
    }

    /// Apply the activation result: `Populated → Activated`.
    pub fn activated(self, result: Result<(), ApiError>) -> DeployResult<Self> {
        let (active, draft) = match self.phase {
            DeployPhase::Populated { active, draft } => (active, draft),
            _ => return Err(self.invalid(DeployStep::Activate)),
        };

        result.map_err(|source| DeployError::ActivationFailed { draft, source })?;

        Ok(self.advance(DeployPhase::Activated { active, draft }))
    }
}

/// Every artifact must report success. The first failure in artifact order
/// is reported; a missing result is a failure too.
fn check_all_artifacts<F>(
    step: DeployStep,
    draft: u32,
    results: ArtifactResults,
    on_error: F,
) -> DeployResult<()>
where
    F: Fn(SnippetName, ApiError) -> DeployError,
{
    let mut results = results;
    for name in SnippetName::ALL {
        let pos = results
            .iter()
            .position(|(n, _)| *n == name)
            .ok_or(DeployError::IncompleteStep {
                step,
                draft,
                artifact: name,
            })?;
        let (_, outcome) = results.swap_remove(pos);
        outcome.map_err(|source| on_error(name, source))?;
    }
    Ok(())
}
