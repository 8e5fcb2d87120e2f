//! Prompt template registry
//!
//! This module provides [`PromptRegistry`], a thread-safe registry for managing
//! and accessing prompt templates.

use crate::{FileLoader, PromptError, PromptTemplate, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// A thread-safe registry of named templates
///
/// Registering a template under an existing name replaces it, which is how
/// directory overrides take effect.
pub struct PromptRegistry {
    templates: RwLock<HashMap<String, Arc<dyn PromptTemplate>>>,
}

impl PromptRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(HashMap::new()),
        }
    }

    /// Register a template, replacing any template with the same name
    pub fn register<T: PromptTemplate + 'static>(&self, template: T) {
        self.register_arc(Arc::new(template));
    }

    /// Register a template wrapped in Arc
    pub fn register_arc(&self, template: Arc<dyn PromptTemplate>) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(template.name().to_string(), template);
    }

    /// Register every template found in `dir`
    ///
    /// Returns the names of the loaded templates.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<String>> {
        let dir = dir.as_ref();
        let templates = FileLoader::new(dir).load_all()?;

        let mut names = Vec::with_capacity(templates.len());
        for template in templates {
            names.push(template.name().to_string());
            self.register(template);
        }
        info!(dir = %dir.display(), templates = ?names, "Loaded prompt overrides");
        Ok(names)
    }

    /// Get a template by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn PromptTemplate>> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Check if a template is registered
    pub fn contains(&self, name: &str) -> bool {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Render a registered template
    pub fn render(&self, name: &str, vars: &serde_json::Value) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| PromptError::TemplateNotRegistered(name.to_string()))?;
        template.render(vars)
    }

    /// List all registered template names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Get the number of registered templates
    pub fn len(&self) -> usize {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("templates", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JinjaTemplate;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_register_and_render() {
        let registry = PromptRegistry::new();
        assert!(registry.is_empty());

        registry.register(JinjaTemplate::new("greeting", "Bonjour, {{ name }} !").unwrap());
        assert!(registry.contains("greeting"));
        assert_eq!(
            registry.render("greeting", &json!({ "name": "Hugo" })).unwrap(),
            "Bonjour, Hugo !"
        );
    }

    #[test]
    fn test_render_not_registered() {
        let registry = PromptRegistry::new();
        let err = registry.render("nonexistent", &json!({})).unwrap_err();
        assert!(matches!(err, PromptError::TemplateNotRegistered(_)));

        let core: agent_core::Error = err.into();
        assert!(matches!(core, agent_core::Error::Configuration(_)));
    }

    #[test]
    fn test_replace_template() {
        let registry = PromptRegistry::new();
        registry.register(JinjaTemplate::new("test", "Version 1").unwrap());
        registry.register(JinjaTemplate::new("test", "Version 2").unwrap());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.render("test", &json!({})).unwrap(), "Version 2");
    }

    #[test]
    fn test_load_dir_overrides() {
        let registry = PromptRegistry::new();
        registry.register(JinjaTemplate::new("search_agent", "Intégré").unwrap());
        registry.register(JinjaTemplate::new("planning_agent", "Intégré").unwrap());

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("search_agent.j2"), "Remplacé").unwrap();

        let loaded = registry.load_dir(dir.path()).unwrap();
        assert_eq!(loaded, ["search_agent"]);
        assert_eq!(registry.render("search_agent", &json!({})).unwrap(), "Remplacé");
        assert_eq!(registry.render("planning_agent", &json!({})).unwrap(), "Intégré");
        assert_eq!(registry.list(), ["planning_agent", "search_agent"]);
    }

    #[test]
    fn test_debug() {
        let registry = PromptRegistry::new();
        registry.register(JinjaTemplate::new("test", "Hello").unwrap());
        assert!(format!("{registry:?}").contains("test"));
    }
}
