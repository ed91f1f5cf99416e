use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::definition::{Skill, SkillInput, SkillOutput};
use crate::error::{Result, SkillError};
use crate::registry::SkillSet;

/// Result of execution with metadata
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub skill: String,
    pub output: SkillOutput,
    pub duration_ms: u64,
}

/// Runs skills with timing, logging and an optional deadline.
///
/// The skill's output is returned untouched and failures are returned as-is;
/// nothing is retried.
#[derive(Debug, Clone, Default)]
pub struct SkillExecutor {
    timeout: Option<Duration>,
}

impl SkillExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Execute a skill from a set by name
    pub async fn execute(
        &self,
        skills: &SkillSet,
        name: &str,
        input: SkillInput,
    ) -> Result<ExecutionResult> {
        let skill = skills
            .get(name)
            .ok_or_else(|| SkillError::UnknownSkill(name.to_string()))?;
        self.run(skill.as_ref(), input).await
    }

    /// Execute a skill directly
    pub async fn run(&self, skill: &dyn Skill, input: SkillInput) -> Result<ExecutionResult> {
        let name = skill.name().to_string();
        let start = Instant::now();

        debug!(skill = %name, "Executing skill");

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, skill.execute(input)).await {
                Ok(result) => result,
                Err(_) => Err(SkillError::Timeout {
                    skill: name.clone(),
                    timeout_ms: limit.as_millis() as u64,
                }),
            },
            None => skill.execute(input).await,
        };

        match outcome {
            Ok(output) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                info!(skill = %name, duration_ms, "Skill executed");
                Ok(ExecutionResult {
                    skill: name,
                    output,
                    duration_ms,
                })
            }
            Err(e) => {
                error!(skill = %name, error = %e, "Skill execution failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::EchoSkill;
    use crate::definition::SkillMetadata;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct SlowSkill {
        metadata: SkillMetadata,
    }

    #[async_trait]
    impl Skill for SlowSkill {
        fn metadata(&self) -> &SkillMetadata {
            &self.metadata
        }

        async fn execute(&self, _input: SkillInput) -> Result<SkillOutput> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(SkillOutput::text("late"))
        }
    }

    #[tokio::test]
    async fn executes_by_name() {
        let mut set = SkillSet::new();
        set.register(Arc::new(EchoSkill::new())).unwrap();

        let result = SkillExecutor::new()
            .execute(&set, "echo", SkillInput::text("ping"))
            .await
            .unwrap();
        assert_eq!(result.skill, "echo");
        assert_eq!(result.output.text, "ping");
        assert_eq!(result.output, SkillOutput::text("ping"));
    }

    #[tokio::test]
    async fn unknown_name_is_an_error() {
        let set = SkillSet::new();
        let err = SkillExecutor::new()
            .execute(&set, "missing", SkillInput::text("ping"))
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::UnknownSkill(name) if name == "missing"));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_turns_into_timeout() {
        let slow = SlowSkill {
            metadata: SkillMetadata::new("slow", "Sleeps"),
        };
        let err = SkillExecutor::new()
            .with_timeout(Duration::from_millis(50))
            .run(&slow, SkillInput::text("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::Timeout { timeout_ms: 50, .. }));
    }
}
