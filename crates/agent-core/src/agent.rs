//! Core Agent trait definition

use crate::{Context, Result};
use async_trait::async_trait;

/// Core trait that all agents must implement
///
/// Agents are immutable once built and shared between concurrent requests,
/// so `process` takes `&self`. Everything request-scoped lives in the
/// [`Context`].
#[async_trait]
pub trait Agent: Send + Sync {
    /// Answer a query and return the final text
    async fn process(&self, input: String, context: &mut Context) -> Result<String>;

    /// Get the agent's name
    fn name(&self) -> &str;

    /// Short description of what the agent is for
    fn description(&self) -> &str {
        ""
    }
}
