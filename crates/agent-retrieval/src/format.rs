//! Rendering of retrieved documents for the model

use crate::{Document, Result};
use agent_prompt::{JinjaTemplate, PromptTemplate};
use serde_json::json;
use std::sync::Arc;

/// Registry name of the documents template
pub const DOCS_TEMPLATE_NAME: &str = "retrieved_docs";

/// Built-in documents template
///
/// Each document is wrapped in numbered `<Document i>` tags, numbered from 0
/// in ranking order, with its source identifier on the first line.
pub const DOCS_TEMPLATE: &str = "## Context provided:
{% for doc in docs %}
<Document {{ loop.index0 }}>
Source: {{ doc.source_id }}
{{ doc.content }}
</Document {{ loop.index0 }}>
{% endfor %}
";

/// Turns a ranked document list into one text block
#[derive(Clone)]
pub struct DocumentFormatter {
    template: Arc<dyn PromptTemplate>,
}

impl DocumentFormatter {
    /// Formatter using the built-in template
    pub fn builtin() -> Result<Self> {
        let template = JinjaTemplate::new(DOCS_TEMPLATE_NAME, DOCS_TEMPLATE)?;
        Ok(Self::new(Arc::new(template)))
    }

    /// Formatter using a custom template; it receives `docs`, a list of
    /// objects with `content`, `source_id` and `score`
    pub fn new(template: Arc<dyn PromptTemplate>) -> Self {
        Self { template }
    }

    /// Name of the underlying template
    pub fn template_name(&self) -> &str {
        self.template.name()
    }

    /// Render `documents` in order
    pub fn format(&self, documents: &[Document]) -> Result<String> {
        Ok(self.template.render(&json!({ "docs": documents }))?)
    }
}

impl std::fmt::Debug for DocumentFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentFormatter")
            .field("template", &self.template.name())
            .finish()
    }
}
