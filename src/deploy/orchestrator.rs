//! Deployment orchestration.
//!
//! Drives a `PlatformApi` through discover, clone, clear, populate and
//! activate, feeding each outcome into `DeploymentState`. Per-artifact
//! requests within a step run concurrently; the step completes only when
//! every request has settled.

use std::future::Future;
use std::time::Instant;

use futures_util::future::join_all;

use crate::deploy::api::PlatformApi;
use crate::deploy::state::{ArtifactResults, DeploymentState};
use crate::deploy::types::{ApiError, DeployReport, DeployResult, DeployStep};
use crate::observability::{record_api_call, record_deploy};
use crate::snippet::{SnippetName, SnippetSet};

/// Runs deployments against one platform API.
#[derive(Debug, Clone)]
pub struct Deployer<A> {
    api: A,
}

impl<A: PlatformApi> Deployer<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Replace the five snippets on a fresh draft of `service_id` and
    /// activate it. The active version is never modified; on failure the
    /// draft is left inactive.
    pub async fn deploy(&self, service_id: &str, snippets: &SnippetSet) -> DeployResult<DeployReport> {
        let result = self.run(service_id, snippets).await;
        record_deploy(result.as_ref().err().map(|e| e.step()));

        if let Err(ref err) = result {
            tracing::error!(
                service_id = %service_id,
                step = %err.step(),
                artifact = ?err.artifact(),
                draft_version = ?err.draft_version(),
                error = %err,
                "Deployment failed"
            );
        }
        result
    }

    async fn run(&self, service_id: &str, snippets: &SnippetSet) -> DeployResult<DeployReport> {
        let state = DeploymentState::new(service_id);

        let versions = timed(DeployStep::Discover, self.api.service_versions(service_id)).await;
        let state = state.discovered(versions)?;
        let active = state.active_version().unwrap_or_default();
        tracing::info!(service_id = %service_id, active_version = active, "Found active version");

        let cloned = timed(DeployStep::Clone, self.api.clone_version(service_id, active)).await;
        let state = state.cloned(cloned)?;
        let draft = state.draft_version().unwrap_or_default();
        tracing::info!(service_id = %service_id, draft_version = draft, "Cloned active version");

        let cleared: ArtifactResults = join_all(SnippetName::ALL.into_iter().map(|name| async move {
            let result = timed(
                DeployStep::Clear,
                self.api.delete_snippet(service_id, draft, name),
            )
            .await;
            (name, result)
        }))
        .await;
        let state = state.cleared(cleared)?;
        tracing::debug!(service_id = %service_id, draft_version = draft, "Cleared snippets");

        let populated: ArtifactResults = join_all(snippets.iter().map(|snippet| async move {
            let result = timed(
                DeployStep::Populate,
                self.api.create_snippet(service_id, draft, snippet),
            )
            .await;
            (snippet.name, result)
        }))
        .await;
        let state = state.populated(populated)?;
        tracing::debug!(service_id = %service_id, draft_version = draft, "Uploaded snippets");

        let activated = timed(DeployStep::Activate, self.api.activate_version(service_id, draft)).await;
        let state = state.activated(activated)?;

        tracing::info!(
            service_id = %service_id,
            previous_version = active,
            activated_version = draft,
            "Deployment activated"
        );

        Ok(DeployReport {
            service_id: state.service_id().to_string(),
            previous_version: active,
            activated_version: draft,
            snippets: snippets.iter().map(|s| s.name).collect(),
        })
    }
}

async fn timed<T, F>(step: DeployStep, call: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    let started = Instant::now();
    let result = call.await;
    record_api_call(step, result.is_ok(), started);
    if let Err(ref err) = result {
        tracing::warn!(step = %step, error = %err, "Platform call failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, CompileOptions};
    use crate::deploy::types::{DeployError, ServiceVersion};
    use crate::snippet::Snippet;
    use crate::source::DistributionConfig;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Versions,
        Clone(u32),
        Delete(u32, SnippetName),
        Create(u32, SnippetName),
        Activate(u32),
    }

    #[derive(Default)]
    struct FakeApi {
        active: Option<u32>,
        fail_delete: Option<SnippetName>,
        fail_create: Option<SnippetName>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeApi {
        fn with_active(active: u32) -> Self {
            Self {
                active: Some(active),
                ..Default::default()
            }
        }

        fn log(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PlatformApi for FakeApi {
        async fn service_versions(&self, _service_id: &str) -> Result<Vec<ServiceVersion>, ApiError> {
            self.log(Call::Versions);
            Ok((1..=3)
                .map(|number| ServiceVersion {
                    number,
                    active: Some(number) == self.active,
                })
                .collect())
        }

        async fn clone_version(&self, _service_id: &str, version: u32) -> Result<u32, ApiError> {
            self.log(Call::Clone(version));
            Ok(4)
        }

        async fn delete_snippet(&self, _service_id: &str, version: u32, name: SnippetName) -> Result<(), ApiError> {
            self.log(Call::Delete(version, name));
            if self.fail_delete == Some(name) {
                return Err(ApiError::Status {
                    status: 500,
                    body: "internal error".into(),
                });
            }
            Ok(())
        }

        async fn create_snippet(&self, _service_id: &str, version: u32, snippet: &Snippet) -> Result<(), ApiError> {
            self.log(Call::Create(version, snippet.name));
            if self.fail_create == Some(snippet.name) {
                return Err(ApiError::Status {
                    status: 400,
                    body: "VCL syntax error".into(),
                });
            }
            Ok(())
        }

        async fn activate_version(&self, _service_id: &str, version: u32) -> Result<(), ApiError> {
            self.log(Call::Activate(version));
            Ok(())
        }
    }

    fn snippets() -> SnippetSet {
        let doc: DistributionConfig = serde_json::from_value(serde_json::json!({
            "Origins": [{ "Id": "o1", "DomainName": "www.example.com" }],
            "DefaultCacheBehavior": [{ "TargetOriginId": "o1" }]
        }))
        .unwrap();
        compile(&doc, "svc", &CompileOptions::default()).unwrap().snippets
    }

    #[tokio::test]
    async fn test_successful_deploy() {
        let deployer = Deployer::new(FakeApi::with_active(2));
        let report = deployer.deploy("svc", &snippets()).await.unwrap();

        assert_eq!(report.previous_version, 2);
        assert_eq!(report.activated_version, 4);
        assert_eq!(report.snippets, SnippetName::ALL.to_vec());

        let calls = deployer.api().calls();
        assert_eq!(calls[0], Call::Versions);
        assert_eq!(calls[1], Call::Clone(2));
        assert_eq!(calls.last(), Some(&Call::Activate(4)));
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::Delete(4, _))).count(), 5);
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::Create(4, _))).count(), 5);

        // Every delete settles before the first create.
        let last_delete = calls.iter().rposition(|c| matches!(c, Call::Delete(..))).unwrap();
        let first_create = calls.iter().position(|c| matches!(c, Call::Create(..))).unwrap();
        assert!(last_delete < first_create);

        // Nothing touches the active version besides cloning it.
        assert!(!calls.iter().any(|c| matches!(c, Call::Delete(2, _) | Call::Create(2, _) | Call::Activate(2))));
    }

    #[tokio::test]
    async fn test_failed_upload_never_activates() {
        let api = FakeApi {
            fail_create: Some(SnippetName::Parse),
            ..FakeApi::with_active(1)
        };
        let deployer = Deployer::new(api);
        let err = deployer.deploy("svc", &snippets()).await.unwrap_err();

        assert!(matches!(
            err,
            DeployError::ArtifactUploadFailed { draft: 4, artifact: SnippetName::Parse, .. }
        ));

        let calls = deployer.api().calls();
        // All five uploads were attempted and none was activated.
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::Create(..))).count(), 5);
        assert!(!calls.iter().any(|c| matches!(c, Call::Activate(_))));
    }

    #[tokio::test]
    async fn test_failed_clear_stops_before_upload() {
        let api = FakeApi {
            fail_delete: Some(SnippetName::Recv),
            ..FakeApi::with_active(2)
        };
        let deployer = Deployer::new(api);
        let err = deployer.deploy("svc", &snippets()).await.unwrap_err();

        assert!(matches!(
            err,
            DeployError::ArtifactClearFailed { draft: 4, artifact: SnippetName::Recv, .. }
        ));
        assert_eq!(err.step(), DeployStep::Clear);
        assert_eq!(err.draft_version(), Some(4));

        let calls = deployer.api().calls();
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::Delete(4, _))).count(), 5);
        assert!(!calls.iter().any(|c| matches!(c, Call::Create(..) | Call::Activate(_))));
    }

    #[tokio::test]
    async fn test_no_active_version_stops_before_clone() {
        let deployer = Deployer::new(FakeApi::default());
        let err = deployer.deploy("svc", &snippets()).await.unwrap_err();

        assert!(matches!(err, DeployError::NoActiveVersion { .. }));
        assert_eq!(deployer.api().calls(), vec![Call::Versions]);
    }
}
