use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{error, info};

use orchestra_agent::{AgentRoster, SharedContext, TurnRole};
use orchestra_skill::{SkillInput, SkillOutput};

use crate::error::{PlannerError, Result};
use crate::plan::Plan;

/// How step outputs become the final response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Every step's text, separated by a blank line
    #[default]
    Concatenate,
    /// Only the last step's text
    Last,
}

impl Aggregation {
    fn apply(self, steps: &[StepOutcome]) -> String {
        match self {
            Aggregation::Concatenate => steps
                .iter()
                .map(|s| s.output.text.trim_end())
                .collect::<Vec<_>>()
                .join("\n\n"),
            Aggregation::Last => steps
                .last()
                .map(|s| s.output.text.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step_id: String,
    pub agent: String,
    pub skill: String,
    pub output: SkillOutput,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub plan: Plan,
    pub steps: Vec<StepOutcome>,
    pub response: String,
}

/// Runs plan steps in order, stopping at the first failure
#[derive(Debug, Clone, Default)]
pub struct PlanExecutor {
    aggregation: Aggregation,
}

impl PlanExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Execute `plan` against `roster`.
    ///
    /// When `context` is given, each step receives its rendered form and
    /// each step's output is recorded into it under the agent's name.
    /// `options` are forwarded to every skill unchanged.
    pub async fn execute(
        &self,
        plan: &Plan,
        roster: &AgentRoster,
        context: Option<&SharedContext>,
        options: &HashMap<String, serde_json::Value>,
    ) -> Result<PlanOutcome> {
        plan.validate(roster)?;

        info!(run = %plan.id, planner = %plan.planner, steps = plan.steps.len(), "Executing plan");

        let mut outcomes: Vec<StepOutcome> = Vec::with_capacity(plan.steps.len());

        for step in &plan.steps {
            let agent = roster.require(&step.agent)?;

            let previous = outcomes.last().map(|o| o.output.text.as_str());
            let text = step.input.resolve(&plan.request, previous);

            let mut input = SkillInput::text(text).with_options(options.clone());
            if let Some(ctx) = context {
                let rendered = ctx.render().await;
                if !rendered.is_empty() {
                    input = input.with_context(rendered);
                }
            }

            let start = Instant::now();
            let output = agent.invoke(&step.skill, input).await.map_err(|source| {
                error!(run = %plan.id, step = %step.step_id, agent = %step.agent, skill = %step.skill, error = %source, "Step failed");
                PlannerError::StepFailed {
                    step_id: step.step_id.clone(),
                    source,
                }
            })?;
            let duration_ms = start.elapsed().as_millis() as u64;

            info!(run = %plan.id, step = %step.step_id, agent = %step.agent, skill = %step.skill, duration_ms, "Step completed");

            if let Some(ctx) = context {
                ctx.record(TurnRole::Agent(step.agent.clone()), output.text.clone()).await;
            }

            outcomes.push(StepOutcome {
                step_id: step.step_id.clone(),
                agent: step.agent.clone(),
                skill: step.skill.clone(),
                output,
                duration_ms,
            });
        }

        let response = self.aggregation.apply(&outcomes);
        Ok(PlanOutcome {
            plan: plan.clone(),
            steps: outcomes,
            response,
        })
    }
}
