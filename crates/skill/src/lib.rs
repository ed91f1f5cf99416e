pub mod builtin;
pub mod definition;
pub mod error;
pub mod executor;
pub mod registry;

pub use builtin::{EchoSkill, FnSkill};
pub use definition::{ExecutionMetadata, Skill, SkillInput, SkillMetadata, SkillOutput};
pub use error::{Result, SkillError};
pub use executor::{ExecutionResult, SkillExecutor};
pub use registry::SkillSet;
