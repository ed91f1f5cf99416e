use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use orchestra_agent::{AgentError, AgentRoster, SharedContext, TurnRole};
use orchestra_skill::SkillInput;

use crate::error::{PlannerError, Result};
use crate::executor::{Aggregation, PlanExecutor, PlanOutcome, StepOutcome};
use crate::plan::Plan;
use crate::traits::Planner;

pub const SYNTHESIS_STEP_ID: &str = "synthesize";

pub struct OrchestratorBuilder {
    planner: Arc<dyn Planner>,
    roster: AgentRoster,
    executor: PlanExecutor,
    memories: Vec<String>,
    synthesizer: Option<(String, String)>,
}

impl OrchestratorBuilder {
    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.executor = self.executor.with_aggregation(aggregation);
        self
    }

    /// Standing guidance seeded into every fresh context
    pub fn with_memory(mut self, memory: impl Into<String>) -> Self {
        self.memories.push(memory.into());
        self
    }

    /// Final step that turns gathered outputs into one answer
    pub fn synthesizer(mut self, agent: &str, skill: &str) -> Self {
        self.synthesizer = Some((agent.to_string(), skill.to_string()));
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        if let Some((agent, skill)) = &self.synthesizer {
            let found = self.roster.require(agent)?;
            if !found.has_capability(skill) {
                return Err(AgentError::UnknownSkill {
                    agent: agent.clone(),
                    skill: skill.clone(),
                }
                .into());
            }
        }

        info!(
            planner = %self.planner.name(),
            agents = self.roster.len(),
            synthesizer = ?self.synthesizer,
            "Orchestrator ready"
        );

        Ok(Orchestrator {
            planner: self.planner,
            roster: self.roster,
            executor: self.executor,
            memories: self.memories,
            synthesizer: self.synthesizer,
        })
    }
}

/// Plans a request, runs it against the roster and assembles the answer.
///
/// Holds no per-request state; share one behind an `Arc` across tasks.
pub struct Orchestrator {
    planner: Arc<dyn Planner>,
    roster: AgentRoster,
    executor: PlanExecutor,
    memories: Vec<String>,
    synthesizer: Option<(String, String)>,
}

impl Orchestrator {
    pub fn builder(planner: Arc<dyn Planner>, roster: AgentRoster) -> OrchestratorBuilder {
        OrchestratorBuilder {
            planner,
            roster,
            executor: PlanExecutor::new(),
            memories: Vec::new(),
            synthesizer: None,
        }
    }

    pub fn roster(&self) -> &AgentRoster {
        &self.roster
    }

    pub fn planner(&self) -> &dyn Planner {
        self.planner.as_ref()
    }

    /// A context seeded with the configured memories
    pub async fn new_context(&self) -> SharedContext {
        let ctx = SharedContext::new();
        for memory in &self.memories {
            ctx.remember(memory.clone()).await;
        }
        ctx
    }

    /// Handle one request in a fresh context
    pub async fn handle(&self, request: &str) -> Result<PlanOutcome> {
        let ctx = self.new_context().await;
        self.handle_in(request, &ctx, &HashMap::new()).await
    }

    /// Handle a request inside a caller-owned context, so history carries
    /// over between calls. `options` reach every skill.
    pub async fn handle_in(
        &self,
        request: &str,
        ctx: &SharedContext,
        options: &HashMap<String, serde_json::Value>,
    ) -> Result<PlanOutcome> {
        let request = checked(request)?;

        let plan = self.planner.plan(request, &self.roster).await?;
        info!(run = %plan.id, planner = %plan.planner, steps = plan.steps.len(), "Planned request");

        ctx.record(TurnRole::User, request).await;

        let mut outcome = self
            .executor
            .execute(&plan, &self.roster, Some(ctx), options)
            .await?;

        if let Some((agent, skill)) = &self.synthesizer {
            let step = self
                .synthesize(&plan, agent, skill, &outcome.steps, ctx, options)
                .await?;
            outcome.response = step.output.text.clone();
            outcome.steps.push(step);
        }

        ctx.record(TurnRole::Assistant, outcome.response.clone()).await;
        Ok(outcome)
    }

    /// Plan without executing
    pub async fn preview(&self, request: &str) -> Result<Plan> {
        let request = checked(request)?;
        let plan = self.planner.plan(request, &self.roster).await?;
        plan.validate(&self.roster)?;
        Ok(plan)
    }

    async fn synthesize(
        &self,
        plan: &Plan,
        agent: &str,
        skill: &str,
        steps: &[StepOutcome],
        ctx: &SharedContext,
        options: &HashMap<String, serde_json::Value>,
    ) -> Result<StepOutcome> {
        let gathered = steps
            .iter()
            .map(|s| format!("[{}.{}]\n{}", s.agent, s.skill, s.output.text.trim_end()))
            .collect::<Vec<_>>()
            .join("\n\n");
        let text = format!(
            "Question: {}\n\nGathered information:\n{}",
            plan.request, gathered
        );

        let mut input = SkillInput::text(text).with_options(options.clone());
        // step outputs are already in the text
        let rendered = ctx.render_dialogue().await;
        if !rendered.is_empty() {
            input = input.with_context(rendered);
        }

        let target = self.roster.require(agent)?;
        let start = Instant::now();
        let output = target.invoke(skill, input).await.map_err(|source| {
            error!(run = %plan.id, agent = %agent, skill = %skill, error = %source, "Synthesis failed");
            PlannerError::StepFailed {
                step_id: SYNTHESIS_STEP_ID.to_string(),
                source,
            }
        })?;
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(run = %plan.id, agent = %agent, skill = %skill, duration_ms, "Synthesized response");

        Ok(StepOutcome {
            step_id: SYNTHESIS_STEP_ID.to_string(),
            agent: agent.to_string(),
            skill: skill.to_string(),
            output,
            duration_ms,
        })
    }
}

fn checked(request: &str) -> Result<&str> {
    let request = request.trim();
    if request.is_empty() {
        return Err(PlannerError::InvalidInput("request is empty".to_string()));
    }
    Ok(request)
}
