//! MiniJinja-based template implementation

use crate::{PromptError, PromptTemplate, Result};
use minijinja::{Environment, UndefinedBehavior};

/// A prompt template backed by MiniJinja
///
/// Variables the template uses must be supplied: rendering with a missing
/// variable is an error rather than an empty string.
///
/// # Template Syntax
///
/// - Variables: `{{ variable }}`
/// - Filters: `{{ name | upper }}`
/// - Conditionals: `{% if condition %}...{% endif %}`
/// - Loops: `{% for item in items %}...{% endfor %}` (with `loop.index0`)
#[derive(Debug, Clone)]
pub struct JinjaTemplate {
    name: String,
    source: String,
}

impl JinjaTemplate {
    /// Compile a template
    ///
    /// Fails with [`PromptError::TemplateParseFailed`] on a syntax error.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        let env = environment();
        env.template_from_str(&source)
            .map_err(|e| PromptError::TemplateParseFailed {
                name: name.clone(),
                detail: e.to_string(),
            })?;

        Ok(Self { name, source })
    }
}

impl PromptTemplate for JinjaTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn render(&self, vars: &serde_json::Value) -> Result<String> {
        let env = environment();
        let value = minijinja::Value::from_serialize(vars);

        env.render_str(&self.source, value)
            .map_err(|e| PromptError::RenderError {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(false);
    env.add_filter("capitalize_first", |s: String| {
        let mut chars = s.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => first.to_uppercase().chain(chars).collect(),
        }
    });
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_loop() {
        let template = JinjaTemplate::new(
            "docs",
            "{% for d in docs %}<Document {{ loop.index0 }}>{{ d }}</Document {{ loop.index0 }}>{% endfor %}",
        )
        .unwrap();

        let out = template.render(&json!({ "docs": ["a", "b"] })).unwrap();
        assert_eq!(out, "<Document 0>a</Document 0><Document 1>b</Document 1>");
    }

    #[test]
    fn test_parse_error_at_creation() {
        let err = JinjaTemplate::new("broken", "{% for x in %}").unwrap_err();
        assert!(matches!(err, PromptError::TemplateParseFailed { ref name, .. } if name == "broken"));
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let template = JinjaTemplate::new("greet", "Bonjour {{ prenom }}").unwrap();
        assert!(template.render(&json!({})).is_err());
    }

    #[test]
    fn test_custom_filter() {
        let template = JinjaTemplate::new("f", "{{ matiere | capitalize_first }}").unwrap();
        assert_eq!(
            template.render(&json!({ "matiere": "mathématiques" })).unwrap(),
            "Mathématiques"
        );
    }
}
