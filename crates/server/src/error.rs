use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use orchestra_agent::AgentError;
use orchestra_planner::PlannerError;
use orchestra_skill::SkillError;

/// Failures starting or running the listener
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// An error rendered as `{"error": message}` with a matching status
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

fn skill_status(err: &SkillError) -> StatusCode {
    match err {
        SkillError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SkillError::UnknownSkill(_) => StatusCode::NOT_FOUND,
        SkillError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        SkillError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        SkillError::DuplicateSkill(_) | SkillError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn agent_status(err: &AgentError) -> StatusCode {
    match err {
        AgentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AgentError::UnknownSkill { .. } | AgentError::UnknownAgent(_) => StatusCode::NOT_FOUND,
        AgentError::DuplicateAgent(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AgentError::Skill(e) => skill_status(e),
    }
}

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        let status = match &err {
            PlannerError::InvalidInput(_) | PlannerError::NoPlan(_) => StatusCode::BAD_REQUEST,
            PlannerError::InvalidPlan(_) | PlannerError::Inference(_) => StatusCode::BAD_GATEWAY,
            PlannerError::StepFailed { source, .. } => agent_status(source),
            PlannerError::Agent(e) => agent_status(e),
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
