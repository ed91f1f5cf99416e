use std::collections::HashMap;
use std::sync::Arc;

use orchestra_agent::builtin::{catalog_agent, documents_agent, support_agent};
use orchestra_agent::{AgentError, AgentRoster, SkillAgent, TurnRole};
use orchestra_inference::{ChatSkill, CompletionClient, MockClient};
use orchestra_planner::{
    Aggregation, ModelPlanner, Orchestrator, Planner, PlannerError, RulePlanner, StepInput,
};
use orchestra_skill::{FnSkill, SkillError};

fn data_sources() -> AgentRoster {
    AgentRoster::new()
        .with(catalog_agent().unwrap())
        .unwrap()
        .with(support_agent().unwrap())
        .unwrap()
}

fn rules() -> Arc<dyn Planner> {
    Arc::new(RulePlanner::shopping_assistant())
}

#[tokio::test]
async fn product_question_reaches_the_catalog() {
    let orchestrator = Orchestrator::builder(rules(), data_sources()).build().unwrap();

    let outcome = orchestrator
        .handle("What laptops do you have available?")
        .await
        .unwrap();

    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(outcome.steps[0].agent, "catalog");
    assert_eq!(
        outcome.response,
        "Product: UltraBook Pro\nPrice: $1299\nSpecifications: 16GB RAM, 512GB SSD, Intel i7\nIn Stock: 15 units"
    );
}

#[tokio::test]
async fn document_question_answers_from_recalled_paragraphs() {
    let writer: Arc<dyn CompletionClient> = Arc::new(MockClient::new("writer"));
    let roster = data_sources()
        .with(documents_agent().unwrap())
        .unwrap()
        .with(
            SkillAgent::builder("assistant")
                .skill(ChatSkill::new(writer))
                .build()
                .unwrap(),
        )
        .unwrap();
    let planner = Arc::new(RulePlanner::shopping_assistant().with_document_recall("assistant", "chat"));
    let orchestrator = Orchestrator::builder(planner, roster)
        .aggregation(Aggregation::Last)
        .build()
        .unwrap();

    let outcome = orchestrator
        .handle("What is the Transformer architecture and why is it important?")
        .await
        .unwrap();

    let skills: Vec<_> = outcome.steps.iter().map(|s| s.skill.as_str()).collect();
    assert_eq!(skills, vec!["recall", "chat"]);
    assert!(outcome.response.starts_with("[writer] The Transformer architecture is a neural network"));
    assert!(outcome.response.ends_with(
        "\n\nBased on the information above, What is the Transformer architecture and why is it important?"
    ));
}

#[tokio::test]
async fn policy_question_reaches_support() {
    let orchestrator = Orchestrator::builder(rules(), data_sources()).build().unwrap();

    let outcome = orchestrator.handle("What's your return policy?").await.unwrap();

    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(outcome.steps[0].skill, "search_support_kb");
    assert!(outcome.response.starts_with("Topic: Return Policy\n"));
}

#[tokio::test]
async fn mixed_question_concatenates_both_sources() {
    let orchestrator = Orchestrator::builder(rules(), data_sources()).build().unwrap();

    let outcome = orchestrator
        .handle("How much does the phone cost and how long does shipping take?")
        .await
        .unwrap();

    let agents: Vec<_> = outcome.steps.iter().map(|s| s.agent.as_str()).collect();
    assert_eq!(agents, vec!["catalog", "support"]);

    let parts: Vec<_> = outcome.response.split("\n\n").collect();
    assert_eq!(parts.len(), 2);
    assert!(parts[0].starts_with("Product: SmartPhone X"));
    assert!(parts[1].starts_with("Topic: Shipping Information"));
}

#[tokio::test]
async fn last_aggregation_returns_only_the_final_source() {
    let orchestrator = Orchestrator::builder(rules(), data_sources())
        .aggregation(Aggregation::Last)
        .build()
        .unwrap();

    let outcome = orchestrator
        .handle("phone price and shipping?")
        .await
        .unwrap();
    assert!(outcome.response.starts_with("Topic: Shipping Information"));
}

#[tokio::test]
async fn synthesizer_receives_question_and_gathered_outputs() {
    let client = Arc::new(MockClient::new("writer"));
    let roster = data_sources()
        .with(
            SkillAgent::builder("assistant")
                .skill(
                    ChatSkill::new(client.clone() as Arc<dyn CompletionClient>)
                        .named("synthesize", "Combine gathered information into one answer"),
                )
                .build()
                .unwrap(),
        )
        .unwrap();

    let orchestrator = Orchestrator::builder(rules(), roster)
        .synthesizer("assistant", "synthesize")
        .build()
        .unwrap();

    let outcome = orchestrator.handle("Is there a warranty on the tablet?").await.unwrap();

    assert_eq!(client.calls(), 1);
    let last = outcome.steps.last().unwrap();
    assert_eq!(last.step_id, "synthesize");
    assert_eq!(outcome.response, last.output.text);
    assert!(outcome
        .response
        .starts_with("[writer] Question: Is there a warranty on the tablet?\n\nGathered information:\n[catalog.search_product_catalog]\nProduct: TabletMax"));
    assert!(outcome.response.contains("[support.search_support_kb]\nTopic: Warranty Coverage"));
}

#[tokio::test]
async fn failing_synthesizer_is_reported_as_its_own_step() {
    let roster = data_sources()
        .with(
            SkillAgent::builder("assistant")
                .skill(
                    ChatSkill::new(Arc::new(MockClient::new("writer").failing("overloaded")))
                        .named("synthesize", "Combine gathered information"),
                )
                .build()
                .unwrap(),
        )
        .unwrap();

    let orchestrator = Orchestrator::builder(rules(), roster)
        .synthesizer("assistant", "synthesize")
        .build()
        .unwrap();

    let err = orchestrator.handle("tablet price").await.unwrap_err();
    assert!(matches!(
        err,
        PlannerError::StepFailed { ref step_id, source: AgentError::Skill(SkillError::ExternalService(_)) }
            if step_id == "synthesize"
    ));
}

#[tokio::test]
async fn fails_fast_on_the_first_broken_step() {
    let roster = AgentRoster::new()
        .with(
            SkillAgent::builder("catalog")
                .skill(FnSkill::new("search_product_catalog", "broken", |_| {
                    Err(SkillError::ExternalService("catalog offline".to_string()))
                }))
                .build()
                .unwrap(),
        )
        .unwrap()
        .with(support_agent().unwrap())
        .unwrap();

    let orchestrator = Orchestrator::builder(rules(), roster).build().unwrap();
    let ctx = orchestrator.new_context().await;

    let err = orchestrator
        .handle_in("phone price and shipping?", &ctx, &HashMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PlannerError::StepFailed { ref step_id, .. } if step_id == "step-1"));
    let roles: Vec<_> = ctx.history().await.into_iter().map(|t| t.role).collect();
    assert_eq!(roles, vec![TurnRole::User]);
}

#[tokio::test]
async fn unmatched_request_without_fallback_has_no_plan() {
    let orchestrator = Orchestrator::builder(rules(), data_sources()).build().unwrap();
    assert!(matches!(
        orchestrator.handle("tell me a joke").await,
        Err(PlannerError::NoPlan(_))
    ));
}

#[tokio::test]
async fn history_carries_between_requests_in_one_context() {
    let orchestrator = Orchestrator::builder(rules(), data_sources())
        .with_memory("Two data sources are available: catalog and support.")
        .build()
        .unwrap();
    let ctx = orchestrator.new_context().await;

    orchestrator
        .handle_in("laptop price", &ctx, &HashMap::new())
        .await
        .unwrap();
    orchestrator
        .handle_in("warranty?", &ctx, &HashMap::new())
        .await
        .unwrap();

    let history = ctx.history().await;
    assert_eq!(history.len(), 6);
    assert_eq!(history[3].content, "warranty?");
    assert!(ctx.render().await.starts_with("Memory:\nTwo data sources are available"));
}

#[tokio::test]
async fn model_planner_drives_a_rewritten_query() {
    let reply = r#"```json
[{"agent": "catalog", "skill": "search_product_catalog", "input": "tablet"}]
```"#;
    let planner = Arc::new(ModelPlanner::new(Arc::new(
        MockClient::new("planner").with_response(reply),
    )));
    let orchestrator = Orchestrator::builder(planner, data_sources()).build().unwrap();

    let outcome = orchestrator
        .handle("what's the cheapest thing with a big screen")
        .await
        .unwrap();

    assert_eq!(outcome.plan.planner, "model");
    assert_eq!(outcome.plan.steps[0].input, StepInput::Literal("tablet".to_string()));
    assert!(outcome.response.starts_with("Product: TabletMax"));
}

#[tokio::test]
async fn concurrent_requests_share_one_orchestrator() {
    let orchestrator = Arc::new(Orchestrator::builder(rules(), data_sources()).build().unwrap());

    let handles: Vec<_> = ["laptop", "phone", "tablet"]
        .into_iter()
        .map(|q| {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.handle(q).await })
        })
        .collect();

    for (handle, name) in handles.into_iter().zip(["UltraBook Pro", "SmartPhone X", "TabletMax"]) {
        let outcome = handle.await.unwrap().unwrap();
        assert!(outcome.response.contains(name));
    }
}
