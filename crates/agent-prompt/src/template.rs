//! Core prompt template trait

use crate::Result;

/// A named template rendered with JSON variables
///
/// The trait is dyn-compatible so registries can hold any implementation.
pub trait PromptTemplate: Send + Sync {
    /// Get the template name/identifier
    fn name(&self) -> &str;

    /// The template source text
    fn source(&self) -> &str;

    /// Render with variables
    fn render(&self, vars: &serde_json::Value) -> Result<String>;
}
