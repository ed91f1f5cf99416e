use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use orchestra_agent::AgentSummary;
use orchestra_planner::{Plan, PlanOutcome, StepOutcome};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RequestQuery {
    pub q: Option<String>,
}

impl RequestQuery {
    fn request(&self) -> Result<&str, ApiError> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ApiError::bad_request("missing query parameter 'q'"))
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanStepResponse {
    pub step_id: String,
    pub agent: String,
    pub skill: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanResponse {
    pub run_id: String,
    pub request: String,
    pub planner: String,
    pub plan: Vec<PlanStepResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StepResponse {
    pub step_id: String,
    pub agent: String,
    pub skill: String,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub run_id: String,
    pub request: String,
    pub plan: Vec<PlanStepResponse>,
    pub steps: Vec<StepResponse>,
    pub response: String,
}

fn plan_steps(plan: &Plan) -> Vec<PlanStepResponse> {
    plan.steps
        .iter()
        .map(|s| PlanStepResponse {
            step_id: s.step_id.clone(),
            agent: s.agent.clone(),
            skill: s.skill.clone(),
        })
        .collect()
}

impl From<StepOutcome> for StepResponse {
    fn from(step: StepOutcome) -> Self {
        Self {
            step_id: step.step_id,
            agent: step.agent,
            skill: step.skill,
            output: step.output.text,
            model: step.output.metadata.model,
            tokens_used: step.output.metadata.tokens_used,
            duration_ms: step.duration_ms,
        }
    }
}

impl From<PlanOutcome> for AnalyzeResponse {
    fn from(outcome: PlanOutcome) -> Self {
        Self {
            run_id: outcome.plan.id.to_string(),
            plan: plan_steps(&outcome.plan),
            request: outcome.plan.request,
            steps: outcome.steps.into_iter().map(StepResponse::from).collect(),
            response: outcome.response,
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        started_at: state.started_at,
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    })
}

pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentSummary>> {
    Json(state.orchestrator.roster().summaries())
}

pub async fn analyze(
    State(state): State<AppState>,
    Query(query): Query<RequestQuery>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let request = query.request()?;

    let outcome = state.orchestrator.handle(request).await.map_err(|e| {
        warn!(error = %e, "Request failed");
        ApiError::from(e)
    })?;

    info!(run = %outcome.plan.id, steps = outcome.steps.len(), "Request answered");
    Ok(Json(outcome.into()))
}

pub async fn preview_plan(
    State(state): State<AppState>,
    Query(query): Query<RequestQuery>,
) -> Result<Json<PlanResponse>, ApiError> {
    let request = query.request()?;
    let plan = state.orchestrator.preview(request).await?;

    Ok(Json(PlanResponse {
        run_id: plan.id.to_string(),
        plan: plan_steps(&plan),
        request: plan.request,
        planner: plan.planner,
    }))
}
