pub mod builtin;
pub mod context;
pub mod error;
pub mod roster;
pub mod skill_agent;
pub mod traits;
pub mod types;

pub use context::{MemoryEntry, SharedContext, Turn, TurnRole};
pub use error::{AgentError, Result};
pub use roster::{AgentRoster, AgentSummary};
pub use skill_agent::{SkillAgent, SkillAgentBuilder};
pub use traits::Agent;
pub use types::{AgentId, Timestamp};

pub mod prelude {
    pub use crate::builtin::{
        catalog_agent, documents_agent, support_agent, DocumentRecallSkill, ProductCatalogSkill,
        SupportKbSkill,
    };
    pub use crate::context::SharedContext;
    pub use crate::error::AgentError;
    pub use crate::roster::AgentRoster;
    pub use crate::skill_agent::SkillAgent;
    pub use crate::traits::Agent;
    pub use crate::types::AgentId;
    pub use async_trait::async_trait;
    pub use orchestra_skill::{Skill, SkillInput, SkillOutput};
}
