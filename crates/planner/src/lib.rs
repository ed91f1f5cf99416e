//! Request planning and execution.
//!
//! A [`Planner`] turns a request into a [`Plan`]: an ordered list of
//! agent/skill steps. The [`PlanExecutor`] runs those steps one after
//! another against an [`AgentRoster`](orchestra_agent::AgentRoster), and the
//! [`Orchestrator`] ties planning, execution, shared context and optional
//! answer synthesis together.

pub mod error;
pub mod executor;
pub mod model_planner;
pub mod orchestrator;
pub mod plan;
pub mod rules;
pub mod traits;

pub use error::{PlannerError, Result};
pub use executor::{Aggregation, PlanExecutor, PlanOutcome, StepOutcome};
pub use model_planner::ModelPlanner;
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use plan::{Plan, PlanStep, RunId, StepInput};
pub use rules::{IntentRule, RulePlanner, RECALL_TEMPLATE};
pub use traits::Planner;
