use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkillError {
    #[error("Invalid skill input: {0}")]
    InvalidInput(String),

    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    #[error("Skill already registered: {0}")]
    DuplicateSkill(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Skill {skill} timed out after {timeout_ms}ms")]
    Timeout { skill: String, timeout_ms: u64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SkillError>;
