use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::error::{AgentError, Result};
use crate::traits::Agent;

/// What a planner or an HTTP client sees of an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
}

/// Agents available to a planner, keyed by unique name.
///
/// Insertion order is kept so catalogues render the same way every time.
#[derive(Clone, Default)]
pub struct AgentRoster {
    agents: Vec<Arc<dyn Agent>>,
    index: HashMap<String, usize>,
}

impl AgentRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, agent: Arc<dyn Agent>) -> Result<()> {
        let name = agent.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AgentError::DuplicateAgent(name));
        }
        info!(agent = %name, capabilities = ?agent.list_capabilities(), "Agent joined roster");
        self.index.insert(name, self.agents.len());
        self.agents.push(agent);
        Ok(())
    }

    pub fn with(mut self, agent: impl Agent + 'static) -> Result<Self> {
        self.add(Arc::new(agent))?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.index.get(name).map(|&i| Arc::clone(&self.agents[i]))
    }

    /// Like [`get`](Self::get) but an error when absent
    pub fn require(&self, name: &str) -> Result<Arc<dyn Agent>> {
        self.get(name)
            .ok_or_else(|| AgentError::UnknownAgent(name.to_string()))
    }

    /// True when `agent` exists and owns `skill`
    pub fn supports(&self, agent: &str, skill: &str) -> bool {
        self.get(agent).map(|a| a.has_capability(skill)).unwrap_or(false)
    }

    pub fn names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn summaries(&self) -> Vec<AgentSummary> {
        self.agents
            .iter()
            .map(|a| AgentSummary {
                name: a.name().to_string(),
                description: a.description().to_string(),
                capabilities: a.list_capabilities(),
            })
            .collect()
    }

    /// One line per agent/skill pair, for prompting a model planner
    pub fn catalogue(&self) -> String {
        self.catalogue_excluding(&[])
    }

    /// [`catalogue`](Self::catalogue) without the listed `(agent, skill)` pairs
    pub fn catalogue_excluding(&self, hidden: &[(String, String)]) -> String {
        let mut lines = Vec::new();
        for agent in &self.agents {
            for skill in agent.describe() {
                if hidden.iter().any(|(a, s)| a == agent.name() && *s == skill.name) {
                    continue;
                }
                lines.push(format!("- {}.{}: {}", agent.name(), skill.name, skill.description));
            }
        }
        lines.join("\n")
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
