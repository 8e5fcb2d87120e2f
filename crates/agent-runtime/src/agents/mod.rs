//! Agent implementations

pub mod delegation;
pub mod prompt;

pub use delegation::AgentTool;
pub use prompt::{PromptAgent, PromptAgentBuilder};
