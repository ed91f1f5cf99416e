use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use orchestra_agent::{AgentError, AgentRoster};

use crate::error::{PlannerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run:{}", self.0)
    }
}

/// Where a step takes its text payload from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", content = "text", rename_all = "snake_case")]
pub enum StepInput {
    /// The original request
    #[default]
    Request,
    /// The previous step's output
    Previous,
    /// Fixed text chosen by the planner
    Literal(String),
    /// Text with `{request}` and `{previous}` filled in at run time
    Template(String),
}

impl StepInput {
    pub const REQUEST_SLOT: &'static str = "{request}";
    pub const PREVIOUS_SLOT: &'static str = "{previous}";

    /// The step payload given the request and the prior step's output
    pub fn resolve(&self, request: &str, previous: Option<&str>) -> String {
        match self {
            StepInput::Request => request.to_string(),
            StepInput::Previous => previous.unwrap_or_default().to_string(),
            StepInput::Literal(text) => text.clone(),
            StepInput::Template(template) => template
                .replace(Self::PREVIOUS_SLOT, previous.unwrap_or_default())
                .replace(Self::REQUEST_SLOT, request),
        }
    }

    fn reads_previous(&self) -> bool {
        match self {
            StepInput::Previous => true,
            StepInput::Template(template) => template.contains(Self::PREVIOUS_SLOT),
            _ => false,
        }
    }
}

/// One agent/skill invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub step_id: String,
    pub agent: String,
    pub skill: String,
    #[serde(default)]
    pub input: StepInput,
}

/// Ordered steps answering one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: RunId,
    pub request: String,
    pub planner: String,
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(request: impl Into<String>, planner: impl Into<String>) -> Self {
        Self {
            id: RunId::new(),
            request: request.into(),
            planner: planner.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step; ids are `step-1`, `step-2`, ...
    pub fn push(&mut self, agent: &str, skill: &str, input: StepInput) -> &PlanStep {
        let step_id = format!("step-{}", self.steps.len() + 1);
        self.steps.push(PlanStep {
            step_id,
            agent: agent.to_string(),
            skill: skill.to_string(),
            input,
        });
        &self.steps[self.steps.len() - 1]
    }

    pub fn then(mut self, agent: &str, skill: &str, input: StepInput) -> Self {
        self.push(agent, skill, input);
        self
    }

    pub fn contains(&self, agent: &str, skill: &str) -> bool {
        self.steps.iter().any(|s| s.agent == agent && s.skill == skill)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check every step against the roster before anything runs
    pub fn validate(&self, roster: &AgentRoster) -> Result<()> {
        if self.steps.is_empty() {
            return Err(PlannerError::NoPlan(self.request.clone()));
        }

        for (i, step) in self.steps.iter().enumerate() {
            let agent = roster.require(&step.agent)?;
            if !agent.has_capability(&step.skill) {
                return Err(AgentError::UnknownSkill {
                    agent: step.agent.clone(),
                    skill: step.skill.clone(),
                }
                .into());
            }
            if i == 0 && step.input.reads_previous() {
                return Err(PlannerError::InvalidPlan(format!(
                    "{} reads a previous output but is the first step",
                    step.step_id
                )));
            }
        }

        Ok(())
    }
}
