use thiserror::Error;

use orchestra_skill::SkillError;

/// Errors raised while building agents or dispatching to their skills.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Malformed agent definition or caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The agent owns no skill with this name
    #[error("Agent '{agent}' has no skill '{skill}'")]
    UnknownSkill { agent: String, skill: String },

    /// Referenced agent does not exist
    #[error("Agent not found: {0}")]
    UnknownAgent(String),

    /// Agent with this name already exists
    #[error("Agent already exists: {0}")]
    DuplicateAgent(String),

    /// The skill itself failed
    #[error(transparent)]
    Skill(#[from] SkillError),
}

impl AgentError {
    pub fn is_unknown_skill(&self) -> bool {
        matches!(
            self,
            AgentError::UnknownSkill { .. } | AgentError::Skill(SkillError::UnknownSkill(_))
        )
    }
}

/// Convenience Result type for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
