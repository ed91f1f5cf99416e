use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::definition::{Skill, SkillMetadata};
use crate::error::{Result, SkillError};

/// Ordered set of skills keyed by name.
///
/// Iteration follows registration order; names are unique.
#[derive(Clone, Default)]
pub struct SkillSet {
    skills: Vec<Arc<dyn Skill>>,
    index: HashMap<String, usize>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a skill
    pub fn register(&mut self, skill: Arc<dyn Skill>) -> Result<()> {
        let name = skill.name().to_string();
        if name.trim().is_empty() {
            return Err(SkillError::InvalidInput("skill name must not be empty".to_string()));
        }
        if self.index.contains_key(&name) {
            return Err(SkillError::DuplicateSkill(name));
        }
        debug!(skill = %name, "Registered skill");
        self.index.insert(name, self.skills.len());
        self.skills.push(skill);
        Ok(())
    }

    /// Get a skill by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Skill>> {
        self.index.get(name).map(|&i| Arc::clone(&self.skills[i]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Skill names in registration order
    pub fn names(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.name().to_string()).collect()
    }

    /// All skill metadata in registration order
    pub fn metadata(&self) -> Vec<SkillMetadata> {
        self.skills.iter().map(|s| s.metadata().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

impl std::fmt::Debug for SkillSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillSet").field("skills", &self.names()).finish()
    }
}
