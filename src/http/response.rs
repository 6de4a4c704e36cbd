//! Error responses.
//!
//! # Responsibilities
//! - Map compile and deploy failures to HTTP status codes
//! - Render every failure as a JSON body
//!
//! # Design Decisions
//! - Failed deploys name the step, the artifact and the leftover draft
//! - Platform failures surface as 502; the caller's request was fine

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::compiler::CompileError;
use crate::deploy::{DeployError, DeployStep};
use crate::snippet::SnippetName;

/// Failure of an inbound request.
#[derive(Debug)]
pub enum AppError {
    MissingCredential,
    InvalidDocument(serde_json::Error),
    Compile(CompileError),
    Deploy(DeployError),
    NotFound,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingCredential => StatusCode::UNAUTHORIZED,
            AppError::InvalidDocument(_) => StatusCode::BAD_REQUEST,
            AppError::Compile(CompileError::InvalidServiceId(_)) => StatusCode::BAD_REQUEST,
            AppError::Compile(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Deploy(DeployError::NoActiveVersion { .. }) => StatusCode::CONFLICT,
            AppError::Deploy(
                DeployError::IncompleteStep { .. } | DeployError::InvalidTransition { .. },
            ) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Deploy(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl From<CompileError> for AppError {
    fn from(err: CompileError) -> Self {
        AppError::Compile(err)
    }
}

impl From<DeployError> for AppError {
    fn from(err: DeployError) -> Self {
        AppError::Deploy(err)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub msg: &'static str,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<DeployStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<SnippetName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_version: Option<u32>,
}

impl ErrorBody {
    fn new(msg: &'static str, detail: impl Into<String>) -> Self {
        Self {
            msg,
            detail: detail.into(),
            step: None,
            artifact: None,
            draft_version: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            AppError::MissingCredential => {
                ErrorBody::new("Unauthorized", "Missing Fastly-Key header")
            }
            AppError::InvalidDocument(err) => {
                ErrorBody::new("Invalid distribution document", err.to_string())
            }
            AppError::Compile(err) => ErrorBody::new("Compilation failed", err.to_string()),
            AppError::Deploy(err) => ErrorBody {
                step: Some(err.step()),
                artifact: err.artifact(),
                draft_version: err.draft_version(),
                ..ErrorBody::new("Deployment failed", err.to_string())
            },
            AppError::NotFound => ErrorBody::new("Bad request", "Route not found"),
        };

        if status.is_client_error() {
            tracing::debug!(status = status.as_u16(), detail = %body.detail, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::BehaviorScope;
    use crate::deploy::ApiError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::MissingCredential.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Compile(CompileError::MissingTargetOrigin(BehaviorScope::Default)).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Deploy(DeployError::NoActiveVersion { service_id: "svc".into() }).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Deploy(DeployError::ActivationFailed {
                draft: 3,
                source: ApiError::Status { status: 500, body: String::new() },
            })
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_deploy_error_body() {
        let err = DeployError::ArtifactClearFailed {
            draft: 9,
            artifact: SnippetName::Fetch,
            source: ApiError::Status { status: 503, body: "unavailable".into() },
        };
        let body = ErrorBody {
            step: Some(err.step()),
            artifact: err.artifact(),
            draft_version: err.draft_version(),
            ..ErrorBody::new("Deployment failed", err.to_string())
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["step"], "clear");
        assert_eq!(json["artifact"], "fetch");
        assert_eq!(json["draft_version"], 9);

        let json = serde_json::to_value(ErrorBody::new("Bad request", "Route not found")).unwrap();
        assert_eq!(json, serde_json::json!({"msg": "Bad request", "detail": "Route not found"}));
    }
}
