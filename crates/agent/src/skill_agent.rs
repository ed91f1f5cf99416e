use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use orchestra_skill::{Skill, SkillExecutor, SkillInput, SkillMetadata, SkillOutput, SkillSet};

use crate::context::SharedContext;
use crate::error::{AgentError, Result};
use crate::traits::Agent;
use crate::types::AgentId;

/// Agent whose capabilities are a fixed set of skills.
///
/// Skills are registered once, through [`SkillAgentBuilder`]; there is no
/// way to add or remove one afterwards.
pub struct SkillAgent {
    id: AgentId,
    name: String,
    description: String,
    skills: SkillSet,
    context: Option<SharedContext>,
    executor: SkillExecutor,
}

impl SkillAgent {
    pub fn builder(name: impl Into<String>) -> SkillAgentBuilder {
        SkillAgentBuilder::new(name)
    }

    pub fn context(&self) -> Option<&SharedContext> {
        self.context.as_ref()
    }

    /// Fill in the rendered shared context unless the caller already did
    async fn prepare(&self, input: SkillInput) -> SkillInput {
        match (&self.context, &input.context) {
            (Some(ctx), None) => {
                let rendered = ctx.render().await;
                if rendered.is_empty() {
                    input
                } else {
                    input.with_context(rendered)
                }
            }
            _ => input,
        }
    }
}

#[async_trait]
impl Agent for SkillAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn list_capabilities(&self) -> Vec<String> {
        self.skills.names()
    }

    fn describe(&self) -> Vec<SkillMetadata> {
        self.skills.metadata()
    }

    fn has_capability(&self, skill: &str) -> bool {
        self.skills.contains(skill)
    }

    async fn invoke(&self, skill: &str, input: SkillInput) -> Result<SkillOutput> {
        let target = self.skills.get(skill).ok_or_else(|| AgentError::UnknownSkill {
            agent: self.name.clone(),
            skill: skill.to_string(),
        })?;

        debug!(agent = %self.name, skill = %skill, "Dispatching to skill");

        let input = self.prepare(input).await;
        let result = self.executor.run(target.as_ref(), input).await?;
        Ok(result.output)
    }
}

impl std::fmt::Debug for SkillAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillAgent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("skills", &self.skills)
            .finish()
    }
}

/// Collects collaborators for a [`SkillAgent`]
pub struct SkillAgentBuilder {
    name: String,
    description: String,
    skills: Vec<Arc<dyn Skill>>,
    context: Option<SharedContext>,
    timeout: Option<Duration>,
}

impl SkillAgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            skills: Vec::new(),
            context: None,
            timeout: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn skill(mut self, skill: impl Skill + 'static) -> Self {
        self.skills.push(Arc::new(skill));
        self
    }

    pub fn shared_skill(mut self, skill: Arc<dyn Skill>) -> Self {
        self.skills.push(skill);
        self
    }

    pub fn context(mut self, context: SharedContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Deadline applied to every skill call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<SkillAgent> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AgentError::InvalidInput("agent name must not be empty".to_string()));
        }
        if self.skills.is_empty() {
            return Err(AgentError::InvalidInput(format!("agent '{}' owns no skills", name)));
        }

        let mut skills = SkillSet::new();
        for skill in self.skills {
            skills.register(skill)?;
        }

        let executor = match self.timeout {
            Some(timeout) => SkillExecutor::new().with_timeout(timeout),
            None => SkillExecutor::new(),
        };

        let agent = SkillAgent {
            id: AgentId::new(),
            name,
            description: self.description,
            skills,
            context: self.context,
            executor,
        };
        info!(agent = %agent.name, id = %agent.id, skills = ?agent.skills.names(), "Agent built");
        Ok(agent)
    }
}
