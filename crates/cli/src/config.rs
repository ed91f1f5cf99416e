use anyhow::{Context, Result};
use clap::ValueEnum;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use orchestra_agent::builtin::{catalog_agent, documents_agent, support_agent};
use orchestra_agent::{AgentRoster, SkillAgent};
use orchestra_inference::{
    AzureOpenAiClient, ChatMessage, ChatRole, ChatSkill, CompletionClient, MockClient, ModelConfig,
};
use orchestra_planner::{ModelPlanner, Orchestrator, Planner, RulePlanner};

pub const ASSISTANT_AGENT: &str = "assistant";
pub const CHAT_SKILL: &str = "chat";
pub const SYNTHESIZE_SKILL: &str = "synthesize";

const PERSONA: &str = "You are a helpful shopping assistant. You have access to a product catalog, \
a customer support knowledge base and reference documents on AI topics. Answer from the information you are given and \
provide clear and helpful responses.";

pub const DATA_SOURCES_MEMORY: &str = "You have access to three data sources:\n\
1. Product Catalog (search_product_catalog): Use this for product inquiries, pricing, \
specifications, and inventory questions.\n\
2. Support Knowledge Base (search_support_kb): Use this for customer support questions \
about shipping, returns, warranty, and policies.\n\
3. Reference Documents (recall): Use this for questions about AI topics such as machine \
learning, natural language processing, computer vision and transformers.";

pub const GUIDELINES_MEMORY: &str = "Decision Guidelines:\n\
- For product-related questions (price, specs, stock): use search_product_catalog\n\
- For policy/support questions (shipping, returns, warranty): use search_support_kb\n\
- You can call both tools if the question requires information from both sources";

pub const DEMO_QUERIES: [&str; 3] = [
    "What laptops do you have available?",
    "What's your return policy?",
    "How much does the phone cost and how long does shipping take?",
];

pub const DOCUMENT_QUERIES: [&str; 3] = [
    "What is machine learning?",
    "What is the Transformer architecture and why is it important?",
    "Compare and contrast computer vision and natural language processing.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlannerKind {
    /// Keyword rules, no model call
    Rules,
    /// Ask the model which sources to query
    Model,
}

/// Everything needed to assemble an orchestrator
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mock: bool,
    pub planner: PlannerKind,
    pub synthesize: bool,
    pub skill_timeout: Option<Duration>,
}

impl AppConfig {
    pub fn client(&self) -> Result<Arc<dyn CompletionClient>> {
        if self.mock {
            info!("Using mock completion client");
            return Ok(Arc::new(MockClient::new("mock")));
        }

        let config = ModelConfig::from_env()
            .context("Azure OpenAI is not configured (set AZURE_OPENAI_* or pass --mock)")?;
        info!(endpoint = %config.endpoint, deployment = %config.deployment, "Using Azure OpenAI");
        Ok(Arc::new(AzureOpenAiClient::new(config)?))
    }

    pub fn roster(&self, client: Arc<dyn CompletionClient>) -> Result<AgentRoster> {
        let mut assistant = SkillAgent::builder(ASSISTANT_AGENT)
            .description("Shopping assistant: general chat and answer synthesis")
            .skill(ChatSkill::new(Arc::clone(&client)).with_system_prompt(PERSONA))
            .skill(
                ChatSkill::new(client)
                    .named(SYNTHESIZE_SKILL, "Combine gathered information into one answer")
                    .with_system_prompt(PERSONA),
            );
        if let Some(timeout) = self.skill_timeout {
            assistant = assistant.timeout(timeout);
        }

        let roster = AgentRoster::new()
            .with(catalog_agent()?)?
            .with(support_agent()?)?
            .with(documents_agent()?)?
            .with(assistant.build()?)?;
        Ok(roster)
    }

    pub fn rules() -> RulePlanner {
        RulePlanner::shopping_assistant()
            .with_document_recall(ASSISTANT_AGENT, CHAT_SKILL)
            .fallback(ASSISTANT_AGENT, CHAT_SKILL)
    }

    pub fn planner(&self, client: Arc<dyn CompletionClient>) -> Arc<dyn Planner> {
        match self.planner {
            PlannerKind::Rules => Arc::new(Self::rules()),
            PlannerKind::Model => {
                let client: Arc<dyn CompletionClient> = if self.mock {
                    let rules = Self::rules();
                    Arc::new(
                        MockClient::new("mock-planner")
                            .with_responder(move |messages| mock_plan_reply(&rules, messages)),
                    )
                } else {
                    client
                };
                Arc::new(ModelPlanner::new(client).hide(ASSISTANT_AGENT, SYNTHESIZE_SKILL))
            }
        }
    }

    pub fn orchestrator(&self) -> Result<Orchestrator> {
        let client = self.client()?;
        let roster = self.roster(Arc::clone(&client))?;
        let planner = self.planner(client);

        let mut builder = Orchestrator::builder(planner, roster)
            .with_memory(DATA_SOURCES_MEMORY)
            .with_memory(GUIDELINES_MEMORY);
        if self.synthesize {
            builder = builder.synthesizer(ASSISTANT_AGENT, SYNTHESIZE_SKILL);
        }
        Ok(builder.build()?)
    }
}

/// JSON step list a planning model would give, chosen by the keyword
/// rules among the capabilities listed in the system prompt
fn mock_plan_reply(rules: &RulePlanner, messages: &[ChatMessage]) -> String {
    let catalogue = messages
        .iter()
        .find(|m| m.role == ChatRole::System)
        .map(|m| m.content.as_str())
        .unwrap_or_default();
    let request = messages
        .iter()
        .rev()
        .find(|m| m.role == ChatRole::User)
        .map(|m| m.content.to_lowercase())
        .unwrap_or_default();
    let offered = |agent: &str, skill: &str| catalogue.contains(&format!("- {}.{}:", agent, skill));

    let mut steps: Vec<Value> = Vec::new();
    for rule in rules.rules().iter().filter(|r| r.matches(&request)) {
        let step = json!({ "agent": rule.agent, "skill": rule.skill });
        if offered(&rule.agent, &rule.skill) && !steps.contains(&step) {
            steps.push(step);
        }
    }
    if steps.is_empty() && offered(ASSISTANT_AGENT, CHAT_SKILL) {
        steps.push(json!({ "agent": ASSISTANT_AGENT, "skill": CHAT_SKILL }));
    }

    Value::Array(steps).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock(planner: PlannerKind, synthesize: bool) -> AppConfig {
        AppConfig {
            mock: true,
            planner,
            synthesize,
            skill_timeout: None,
        }
    }

    #[test]
    fn roster_has_both_sources_and_the_assistant() {
        let config = mock(PlannerKind::Rules, true);
        let roster = config.roster(config.client().unwrap()).unwrap();

        assert_eq!(roster.names(), vec!["catalog", "support", "documents", "assistant"]);
        assert!(roster.supports(ASSISTANT_AGENT, SYNTHESIZE_SKILL));
        assert!(roster.supports(ASSISTANT_AGENT, CHAT_SKILL));
    }

    #[tokio::test]
    async fn raw_rules_answer_matches_the_catalog() {
        let orchestrator = mock(PlannerKind::Rules, false).orchestrator().unwrap();
        let outcome = orchestrator.handle(DEMO_QUERIES[0]).await.unwrap();
        assert!(outcome.response.starts_with("Product: UltraBook Pro"));
    }

    #[tokio::test]
    async fn synthesis_runs_after_both_sources() {
        let orchestrator = mock(PlannerKind::Rules, true).orchestrator().unwrap();
        let outcome = orchestrator.handle(DEMO_QUERIES[2]).await.unwrap();

        let skills: Vec<_> = outcome.steps.iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(
            skills,
            vec!["search_product_catalog", "search_support_kb", SYNTHESIZE_SKILL]
        );
        assert!(outcome.response.starts_with("[mock] Question: How much does the phone cost"));
    }

    #[test]
    fn model_planner_is_selectable() {
        let config = mock(PlannerKind::Model, false);
        assert_eq!(config.planner(config.client().unwrap()).name(), "model");
    }

    #[tokio::test]
    async fn mock_model_planner_produces_runnable_plans() {
        let orchestrator = mock(PlannerKind::Model, false).orchestrator().unwrap();

        let outcome = orchestrator.handle(DEMO_QUERIES[0]).await.unwrap();
        assert_eq!(outcome.plan.planner, "model");
        assert!(outcome.response.starts_with("Product: UltraBook Pro"));

        let outcome = orchestrator.handle(DEMO_QUERIES[2]).await.unwrap();
        let agents: Vec<_> = outcome.steps.iter().map(|s| s.agent.as_str()).collect();
        assert_eq!(agents, vec!["catalog", "support"]);

        let outcome = orchestrator.handle("tell me a joke").await.unwrap();
        assert_eq!(outcome.steps[0].skill, CHAT_SKILL);
    }

    #[tokio::test]
    async fn mock_model_planner_never_picks_the_synthesizer() {
        let orchestrator = mock(PlannerKind::Model, true).orchestrator().unwrap();
        let outcome = orchestrator.handle("please synthesize an answer").await.unwrap();

        let skills: Vec<_> = outcome.steps.iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(skills, vec![CHAT_SKILL, SYNTHESIZE_SKILL]);
    }

    #[tokio::test]
    async fn document_questions_answer_from_recalled_text() {
        let orchestrator = mock(PlannerKind::Rules, false).orchestrator().unwrap();
        let outcome = orchestrator.handle(DOCUMENT_QUERIES[0]).await.unwrap();

        assert_eq!(outcome.steps[0].skill, "recall");
        let answer = &outcome.steps[1].output.text;
        assert!(answer.starts_with("[mock] Machine learning is a subset"));
        assert!(answer.ends_with("Based on the information above, What is machine learning?"));
    }
}
