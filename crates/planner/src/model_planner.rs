use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use orchestra_agent::AgentRoster;
use orchestra_inference::{ChatMessage, CompletionClient, GenerationParams};

use crate::error::{PlannerError, Result};
use crate::plan::{Plan, StepInput};
use crate::traits::Planner;

const DEFAULT_MAX_STEPS: usize = 5;

const PLANNER_PROMPT: &str = "You route customer requests to capabilities. \
Pick the capabilities needed to answer the request, in the order they should run. \
Call several when the request needs information from several sources.\n\
Respond with only a JSON array. Each element is an object with \"agent\" and \"skill\" \
taken from the list below, and an optional \"input\" string when the capability needs \
a rewritten query instead of the original request.\n\nCapabilities:\n";

#[derive(Debug, Deserialize)]
struct ProposedStep {
    agent: String,
    skill: String,
    #[serde(default)]
    input: Option<String>,
}

/// Lets a completion model choose the steps
pub struct ModelPlanner {
    client: Arc<dyn CompletionClient>,
    params: GenerationParams,
    max_steps: usize,
    hidden: Vec<(String, String)>,
}

impl ModelPlanner {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            params: GenerationParams {
                temperature: 0.0,
                max_tokens: 400,
                ..Default::default()
            },
            max_steps: DEFAULT_MAX_STEPS,
            hidden: Vec::new(),
        }
    }

    /// Keep `agent.skill` out of the prompt and out of accepted plans,
    /// e.g. the orchestrator's synthesizer
    pub fn hide(mut self, agent: &str, skill: &str) -> Self {
        self.hidden.push((agent.to_string(), skill.to_string()));
        self
    }

    fn offers(&self, roster: &AgentRoster, agent: &str, skill: &str) -> bool {
        roster.supports(agent, skill) && !self.hidden.iter().any(|(a, s)| a == agent && s == skill)
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    fn messages(&self, request: &str, roster: &AgentRoster) -> Vec<ChatMessage> {
        let system = format!("{}{}", PLANNER_PROMPT, roster.catalogue_excluding(&self.hidden));
        vec![ChatMessage::system(&system), ChatMessage::user(request)]
    }

    fn parse(&self, request: &str, reply: &str, roster: &AgentRoster) -> Result<Plan> {
        let json = extract_json_block(reply);
        let proposed: Vec<ProposedStep> = serde_json::from_str(json).map_err(|e| {
            PlannerError::InvalidPlan(format!("model reply is not a step list: {}", e))
        })?;

        if proposed.is_empty() {
            return Err(PlannerError::NoPlan(request.to_string()));
        }
        if proposed.len() > self.max_steps {
            return Err(PlannerError::InvalidPlan(format!(
                "{} steps proposed, at most {} allowed",
                proposed.len(),
                self.max_steps
            )));
        }

        let mut plan = Plan::new(request, self.name());
        for step in proposed {
            if !self.offers(roster, &step.agent, &step.skill) {
                return Err(PlannerError::InvalidPlan(format!(
                    "unknown capability {}.{}",
                    step.agent, step.skill
                )));
            }
            let input = match step.input.filter(|t| !t.trim().is_empty()) {
                Some(text) => StepInput::Literal(text),
                None => StepInput::Request,
            };
            plan.push(&step.agent, &step.skill, input);
        }
        Ok(plan)
    }
}

/// Body of a fenced ```json block, else the outermost `[...]`, else the trimmed reply
fn extract_json_block(reply: &str) -> &str {
    if let Some(start) = reply.find("```json") {
        let content = &reply[start + 7..];
        return content
            .find("```")
            .map(|end| content[..end].trim())
            .unwrap_or_else(|| content.trim());
    }

    if let (Some(start), Some(end)) = (reply.find('['), reply.rfind(']')) {
        if start < end {
            return &reply[start..=end];
        }
    }

    reply.trim()
}

#[async_trait]
impl Planner for ModelPlanner {
    fn name(&self) -> &str {
        "model"
    }

    async fn plan(&self, request: &str, roster: &AgentRoster) -> Result<Plan> {
        if roster.is_empty() {
            return Err(PlannerError::NoPlan(request.to_string()));
        }

        let completion = self
            .client
            .chat(&self.messages(request, roster), &self.params)
            .await?;
        debug!(model = %completion.model, reply = %completion.text, "Planner reply");

        let plan = self.parse(request, &completion.text, roster)?;
        info!(run = %plan.id, steps = plan.steps.len(), "Model produced plan");
        Ok(plan)
    }
}
