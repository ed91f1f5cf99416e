use thiserror::Error;

use orchestra_agent::AgentError;
use orchestra_inference::InferenceError;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("No plan for request: {0}")]
    NoPlan(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Step {step_id} failed: {source}")]
    StepFailed {
        step_id: String,
        #[source]
        source: AgentError,
    },

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Planning model failed: {0}")]
    Inference(#[from] InferenceError),
}

impl PlannerError {
    /// The agent-level error behind this failure, if any
    pub fn agent_error(&self) -> Option<&AgentError> {
        match self {
            PlannerError::StepFailed { source, .. } => Some(source),
            PlannerError::Agent(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
