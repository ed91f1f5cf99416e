use async_trait::async_trait;
use tracing::{debug, warn};

use orchestra_agent::AgentRoster;

use crate::error::{PlannerError, Result};
use crate::plan::{Plan, StepInput};
use crate::traits::Planner;

/// Answer prompt placed after recalled text
pub const RECALL_TEMPLATE: &str = "{previous}\n\nBased on the information above, {request}";

/// Keywords that route a request to one agent/skill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub agent: String,
    pub skill: String,
    /// Step queued right after the matched one
    pub follow_up: Option<(String, String, StepInput)>,
}

impl IntentRule {
    pub fn new(name: &str, agent: &str, skill: &str) -> Self {
        Self {
            name: name.to_string(),
            keywords: Vec::new(),
            agent: agent.to_string(),
            skill: skill.to_string(),
            follow_up: None,
        }
    }

    pub fn then(mut self, agent: &str, skill: &str, input: StepInput) -> Self {
        self.follow_up = Some((agent.to_string(), skill.to_string(), input));
        self
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_lowercase()).collect();
        self
    }

    /// `request` must already be lower-cased
    pub fn matches(&self, request: &str) -> bool {
        self.keywords.iter().any(|k| request.contains(k.as_str()))
    }
}

/// Deterministic keyword planner.
///
/// Every matching rule adds a step, in rule order, so one request can reach
/// several data sources. Requests that match nothing go to the fallback.
#[derive(Debug, Clone, Default)]
pub struct RulePlanner {
    rules: Vec<IntentRule>,
    fallback: Option<(String, String)>,
}

impl RulePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: IntentRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn fallback(mut self, agent: &str, skill: &str) -> Self {
        self.fallback = Some((agent.to_string(), skill.to_string()));
        self
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Product questions go to the catalog, policy questions to support.
    pub fn shopping_assistant() -> Self {
        Self::new()
            .rule(
                IntentRule::new("products", "catalog", "search_product_catalog").keywords(&[
                    "product",
                    "laptop",
                    "phone",
                    "tablet",
                    "ultrabook",
                    "price",
                    "how much",
                    "spec",
                    "stock",
                    "inventory",
                ]),
            )
            .rule(
                IntentRule::new("support", "support", "search_support_kb").keywords(&[
                    "shipping",
                    "deliver",
                    "return",
                    "refund",
                    "warranty",
                    "policy",
                    "policies",
                ]),
            )
    }

    /// Route AI-topic questions to the `documents` recall, then have
    /// `agent.skill` answer with the recalled paragraphs in front of the
    /// question.
    pub fn with_document_recall(self, agent: &str, skill: &str) -> Self {
        self.rule(
            IntentRule::new("documents", "documents", "recall")
                .keywords(&[
                    "artificial intelligence",
                    "machine learning",
                    "deep learning",
                    "neural",
                    "natural language",
                    "nlp",
                    "computer vision",
                    "reinforcement learning",
                    "generative",
                    "transformer",
                    "language model",
                ])
                .then(agent, skill, StepInput::Template(RECALL_TEMPLATE.to_string())),
        )
    }
}

#[async_trait]
impl Planner for RulePlanner {
    fn name(&self) -> &str {
        "rules"
    }

    async fn plan(&self, request: &str, roster: &AgentRoster) -> Result<Plan> {
        let lowered = request.to_lowercase();
        let mut plan = Plan::new(request, self.name());

        for rule in self.rules.iter().filter(|r| r.matches(&lowered)) {
            if !roster.supports(&rule.agent, &rule.skill) {
                warn!(rule = %rule.name, agent = %rule.agent, skill = %rule.skill, "Rule target not in roster, skipping");
                continue;
            }
            if plan.contains(&rule.agent, &rule.skill) {
                continue;
            }
            debug!(rule = %rule.name, "Rule matched");
            plan.push(&rule.agent, &rule.skill, StepInput::Request);

            if let Some((agent, skill, input)) = &rule.follow_up {
                if !roster.supports(agent, skill) {
                    warn!(rule = %rule.name, agent = %agent, skill = %skill, "Follow-up not in roster, skipping");
                } else if !plan.contains(agent, skill) {
                    plan.push(agent, skill, input.clone());
                }
            }
        }

        if plan.is_empty() {
            match &self.fallback {
                Some((agent, skill)) if roster.supports(agent, skill) => {
                    debug!(agent = %agent, skill = %skill, "Using fallback");
                    plan.push(agent, skill, StepInput::Request);
                }
                _ => return Err(PlannerError::NoPlan(request.to_string())),
            }
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_agent::builtin::{catalog_agent, documents_agent, support_agent};
    use orchestra_agent::SkillAgent;
    use orchestra_skill::EchoSkill;

    fn roster() -> AgentRoster {
        AgentRoster::new()
            .with(catalog_agent().unwrap())
            .unwrap()
            .with(support_agent().unwrap())
            .unwrap()
    }

    fn targets(plan: &Plan) -> Vec<(String, String)> {
        plan.steps
            .iter()
            .map(|s| (s.agent.clone(), s.skill.clone()))
            .collect()
    }

    #[tokio::test]
    async fn routes_product_and_policy_questions() {
        let planner = RulePlanner::shopping_assistant();
        let roster = roster();

        let plan = planner.plan("What laptops do you have available?", &roster).await.unwrap();
        assert_eq!(
            targets(&plan),
            vec![("catalog".to_string(), "search_product_catalog".to_string())]
        );

        let plan = planner.plan("What's your return policy?", &roster).await.unwrap();
        assert_eq!(
            targets(&plan),
            vec![("support".to_string(), "search_support_kb".to_string())]
        );
    }

    #[tokio::test]
    async fn mixed_question_reaches_both_sources_in_rule_order() {
        let plan = RulePlanner::shopping_assistant()
            .plan("How much does the phone cost and how long does shipping take?", &roster())
            .await
            .unwrap();

        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].agent, "catalog");
        assert_eq!(plan.steps[1].agent, "support");
        assert_eq!(plan.planner, "rules");
    }

    #[tokio::test]
    async fn no_match_without_fallback_is_no_plan() {
        let err = RulePlanner::shopping_assistant()
            .plan("tell me a joke", &roster())
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::NoPlan(_)));
    }

    #[tokio::test]
    async fn fallback_used_only_when_present_in_roster() {
        let roster = roster()
            .with(
                SkillAgent::builder("assistant")
                    .skill(EchoSkill::named("chat"))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let planner = RulePlanner::shopping_assistant().fallback("assistant", "chat");

        let plan = planner.plan("tell me a joke", &roster).await.unwrap();
        assert_eq!(targets(&plan), vec![("assistant".to_string(), "chat".to_string())]);

        let planner = RulePlanner::shopping_assistant().fallback("ghost", "chat");
        assert!(matches!(
            planner.plan("tell me a joke", &roster).await,
            Err(PlannerError::NoPlan(_))
        ));
    }

    #[tokio::test]
    async fn skips_rules_whose_agent_is_missing() {
        let roster = AgentRoster::new().with(support_agent().unwrap()).unwrap();
        let plan = RulePlanner::shopping_assistant()
            .plan("phone warranty?", &roster)
            .await
            .unwrap();
        assert_eq!(
            targets(&plan),
            vec![("support".to_string(), "search_support_kb".to_string())]
        );
    }

    #[tokio::test]
    async fn document_questions_recall_then_answer() {
        let roster = roster()
            .with(documents_agent().unwrap())
            .unwrap()
            .with(
                SkillAgent::builder("assistant")
                    .skill(EchoSkill::named("chat"))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let planner = RulePlanner::shopping_assistant()
            .with_document_recall("assistant", "chat")
            .fallback("assistant", "chat");

        let plan = planner.plan("What is machine learning?", &roster).await.unwrap();
        assert_eq!(
            targets(&plan),
            vec![
                ("documents".to_string(), "recall".to_string()),
                ("assistant".to_string(), "chat".to_string()),
            ]
        );
        assert_eq!(plan.steps[1].input, StepInput::Template(RECALL_TEMPLATE.to_string()));
        assert!(plan.validate(&roster).is_ok());

        // shopping questions keep their single step
        let plan = planner.plan("What laptops do you have?", &roster).await.unwrap();
        assert_eq!(plan.steps.len(), 1);
    }

    #[tokio::test]
    async fn recall_without_answer_agent_is_a_single_step() {
        let roster = AgentRoster::new().with(documents_agent().unwrap()).unwrap();
        let plan = RulePlanner::new()
            .with_document_recall("assistant", "chat")
            .plan("Explain the transformer architecture", &roster)
            .await
            .unwrap();
        assert_eq!(targets(&plan), vec![("documents".to_string(), "recall".to_string())]);
    }

    #[tokio::test]
    async fn duplicate_targets_collapse() {
        let planner = RulePlanner::new()
            .rule(IntentRule::new("a", "catalog", "search_product_catalog").keywords(&["phone"]))
            .rule(IntentRule::new("b", "catalog", "search_product_catalog").keywords(&["price"]));
        let plan = planner.plan("phone price", &roster()).await.unwrap();
        assert_eq!(plan.steps.len(), 1);
    }
}
