//! Per-agent tool sets
//!
//! A registry is the closed capability set of one agent: filled at
//! construction, validated as tools are added, then frozen behind an `Arc`
//! and only read on the request path.

use crate::Tool;
use agent_core::{Error, Result};
use agent_llm::ToolDefinition;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]{0,63}$").unwrap()
});

/// Check that `name` can be used as an agent or tool identifier
pub fn validate_identifier(what: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Configuration(format!("{what} name must not be empty")));
    }
    if !IDENTIFIER.is_match(name) {
        return Err(Error::Configuration(format!(
            "{what} name '{name}' must start with a letter or underscore and contain at most 64 letters, digits, '_' or '-'"
        )));
    }
    Ok(())
}

/// Ordered, name-indexed set of tools
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of tools, in order
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Register a tool
    ///
    /// Fails with a configuration error when the name is invalid or taken,
    /// or when the input schema is not an object schema.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        validate_identifier("Tool", &name)?;

        if self.index.contains_key(&name) {
            return Err(Error::Configuration(format!(
                "Tool '{name}' is declared more than once"
            )));
        }

        let schema = tool.input_schema();
        if schema.get("type").and_then(Value::as_str) != Some("object") {
            return Err(Error::Configuration(format!(
                "Tool '{name}' input schema must be a JSON object schema"
            )));
        }

        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| Arc::clone(&self.tools[i]))
    }

    /// Whether a tool with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All tools, in registration order
    pub fn list_tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Tool names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// The manifest sent to the completion backend
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.input_schema()))
            .collect()
    }

    /// Every agent reachable through these tools
    pub fn reachable_agents(&self) -> Vec<String> {
        let mut agents: Vec<String> = self
            .tools
            .iter()
            .flat_map(|t| t.reachable_agents())
            .collect();
        agents.sort();
        agents.dedup();
        agents
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
