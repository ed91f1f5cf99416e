use async_trait::async_trait;

use orchestra_agent::AgentRoster;

use crate::error::Result;
use crate::plan::Plan;

/// Turns a request into an ordered plan over the agents in a roster.
///
/// Planners keep no state between requests.
#[async_trait]
pub trait Planner: Send + Sync {
    fn name(&self) -> &str;

    async fn plan(&self, request: &str, roster: &AgentRoster) -> Result<Plan>;
}
