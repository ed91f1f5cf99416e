use async_trait::async_trait;

use orchestra_skill::{SkillInput, SkillMetadata, SkillOutput};

use crate::error::AgentError;
use crate::types::AgentId;

/// A named role exposing skills as invokable capabilities.
///
/// Agents never call one another; sequencing belongs to the planner.
#[async_trait]
pub trait Agent: Send + Sync {
    fn id(&self) -> &AgentId;

    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Names of the skills this agent owns, in registration order
    fn list_capabilities(&self) -> Vec<String>;

    fn describe(&self) -> Vec<SkillMetadata>;

    fn has_capability(&self, skill: &str) -> bool {
        self.list_capabilities().iter().any(|s| s == skill)
    }

    async fn invoke(&self, skill: &str, input: SkillInput) -> Result<SkillOutput, AgentError>;
}
