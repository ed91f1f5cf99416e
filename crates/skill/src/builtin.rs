use async_trait::async_trait;

use crate::definition::{Skill, SkillInput, SkillMetadata, SkillOutput};
use crate::error::Result;

type SkillFn = dyn Fn(&SkillInput) -> Result<String> + Send + Sync;

/// Pure skill backed by a closure
pub struct FnSkill {
    metadata: SkillMetadata,
    func: Box<SkillFn>,
}

impl FnSkill {
    pub fn new<F>(name: &str, description: &str, func: F) -> Self
    where
        F: Fn(&SkillInput) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            metadata: SkillMetadata::new(name, description),
            func: Box::new(func),
        }
    }

    pub fn with_tags(mut self, tags: Vec<&str>) -> Self {
        self.metadata = self.metadata.with_tags(tags);
        self
    }
}

#[async_trait]
impl Skill for FnSkill {
    fn metadata(&self) -> &SkillMetadata {
        &self.metadata
    }

    async fn execute(&self, input: SkillInput) -> Result<SkillOutput> {
        let text = (self.func)(&input)?;
        Ok(SkillOutput::text(text))
    }
}

/// Returns its payload unchanged
pub struct EchoSkill {
    metadata: SkillMetadata,
}

impl EchoSkill {
    pub fn new() -> Self {
        Self::named("echo")
    }

    pub fn named(name: &str) -> Self {
        Self {
            metadata: SkillMetadata::new(name, "Echo the input payload").with_tags(vec!["debug"]),
        }
    }
}

impl Default for EchoSkill {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Skill for EchoSkill {
    fn metadata(&self) -> &SkillMetadata {
        &self.metadata
    }

    async fn execute(&self, input: SkillInput) -> Result<SkillOutput> {
        let text = input.require_text()?;
        Ok(SkillOutput::text(text))
    }
}
