//! Named prompt templates for the tutoring agents
//!
//! Agent instructions and the document block produced by retrieval are
//! MiniJinja templates. Every template is compiled when it is created, so a
//! syntax error surfaces at startup instead of on the first request.
//!
//! # Quick Start
//!
//! ```
//! use agent_prompt::{JinjaTemplate, PromptRegistry};
//! use serde_json::json;
//!
//! let registry = PromptRegistry::new();
//! registry.register(JinjaTemplate::new("salutation", "Bonjour {{ prenom }} !").unwrap());
//!
//! let text = registry.render("salutation", &json!({ "prenom": "Léa" })).unwrap();
//! assert_eq!(text, "Bonjour Léa !");
//! ```
//!
//! # Overrides
//!
//! [`PromptRegistry::load_dir`] reads every `<name>.j2` (or `<name>.jinja`)
//! file of a directory and replaces the template of the same name.

mod error;
mod jinja;
mod loader;
mod registry;
mod template;

pub use error::{PromptError, Result};
pub use jinja::JinjaTemplate;
pub use loader::FileLoader;
pub use registry::PromptRegistry;
pub use template::PromptTemplate;
