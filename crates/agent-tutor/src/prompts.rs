//! Agent instructions
//!
//! Instructions are MiniJinja templates registered under the agent's name.
//! The built-in set ships inside the crate; a prompts directory can
//! override any of them (`search_agent.j2`, `orchestrator_agent.j2`,
//! `retrieved_docs.j2`, ...).

use crate::error::Result;
use crate::routing::RoutingPolicy;
use crate::specialists::Specialist;
use agent_prompt::{JinjaTemplate, PromptError, PromptRegistry, PromptTemplate};
use agent_retrieval::{DOCS_TEMPLATE, DOCS_TEMPLATE_NAME, DocumentFormatter};
use serde_json::json;
use std::path::Path;

/// Template name of the orchestrator instruction
pub const ORCHESTRATOR_TEMPLATE: &str = "orchestrator_agent";

const BUILTIN_TEMPLATES: [(&str, &str); 5] = [
    ("search_agent", include_str!("../prompts/search_agent.j2")),
    ("pedagogical_agent", include_str!("../prompts/pedagogical_agent.j2")),
    ("assessment_agent", include_str!("../prompts/assessment_agent.j2")),
    ("planning_agent", include_str!("../prompts/planning_agent.j2")),
    (ORCHESTRATOR_TEMPLATE, include_str!("../prompts/orchestrator_agent.j2")),
];

/// Registry holding every built-in template
pub fn builtin_registry() -> Result<PromptRegistry> {
    let registry = PromptRegistry::new();
    for (name, source) in BUILTIN_TEMPLATES {
        registry.register(JinjaTemplate::new(name, source)?);
    }
    registry.register(JinjaTemplate::new(DOCS_TEMPLATE_NAME, DOCS_TEMPLATE)?);
    Ok(registry)
}

/// Built-in registry with the templates of `dir` layered on top
pub fn registry_with_overrides(dir: Option<&Path>) -> Result<PromptRegistry> {
    let registry = builtin_registry()?;
    if let Some(dir) = dir {
        registry.load_dir(dir)?;
    }
    Ok(registry)
}

/// Instruction of `specialist`
pub fn specialist_instruction(registry: &PromptRegistry, specialist: Specialist) -> Result<String> {
    Ok(registry.render(specialist.agent_name(), &json!({}))?)
}

/// Orchestrator instruction, listing the routes of `policy`
pub fn orchestrator_instruction(registry: &PromptRegistry, policy: &RoutingPolicy) -> Result<String> {
    Ok(registry.render(
        ORCHESTRATOR_TEMPLATE,
        &json!({ "version": policy.version, "routes": policy.routes }),
    )?)
}

/// Formatter for `retrieve_docs`, using the registry's documents template
pub fn docs_formatter(registry: &PromptRegistry) -> Result<DocumentFormatter> {
    let template: std::sync::Arc<dyn PromptTemplate> = registry
        .get(DOCS_TEMPLATE_NAME)
        .ok_or_else(|| PromptError::TemplateNotRegistered(DOCS_TEMPLATE_NAME.to_string()))?;
    Ok(DocumentFormatter::new(template))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_retrieval::Document;

    #[test]
    fn test_builtin_templates_registered() {
        let registry = builtin_registry().unwrap();
        assert_eq!(
            registry.list(),
            [
                "assessment_agent",
                "orchestrator_agent",
                "pedagogical_agent",
                "planning_agent",
                "retrieved_docs",
                "search_agent"
            ]
        );
    }

    #[test]
    fn test_specialist_instructions_mention_their_role() {
        let registry = builtin_registry().unwrap();
        for specialist in Specialist::ALL {
            let instruction = specialist_instruction(&registry, specialist).unwrap();
            assert!(instruction.len() > 50);
            assert!(
                instruction.to_lowercase().contains(specialist.instruction_keyword()),
                "{specialist} instruction lacks '{}'",
                specialist.instruction_keyword()
            );
        }
    }

    #[test]
    fn test_orchestrator_instruction_follows_policy() {
        let registry = builtin_registry().unwrap();
        let policy = RoutingPolicy::builtin().unwrap();
        let instruction = orchestrator_instruction(&registry, &policy).unwrap();

        assert!(instruction.to_lowercase().contains("orchestrateur"));
        assert!(instruction.contains("1. **search_agent** - Agent de Recherche"));
        assert!(instruction.contains("4. **planning_agent** - Agent de Planification"));
        assert!(instruction.contains("   - Exemple : \"Crée un quiz sur les fractions\""));
        assert!(instruction.contains(
            "- Besoin d'explication → pedagogical_agent (+ search_agent si nécessaire)\n"
        ));
        assert!(instruction.contains("- Besoin d'organisation → planning_agent\n- Préparation contrôle"));
    }

    #[test]
    fn test_orchestrator_instruction_tracks_policy_changes() {
        let registry = builtin_registry().unwrap();
        let mut policy = RoutingPolicy::builtin().unwrap();
        policy.routes.truncate(1);

        let instruction = orchestrator_instruction(&registry, &policy).unwrap();
        assert!(instruction.contains("search_agent"));
        assert!(!instruction.contains("**planning_agent**"));
    }

    #[test]
    fn test_directory_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("planning_agent.j2"),
            "Tu es un agent de planification pour le lycée.",
        )
        .unwrap();
        std::fs::write(dir.path().join("retrieved_docs.j2"), "{% for d in docs %}[{{ d.source_id }}]{% endfor %}")
            .unwrap();

        let registry = registry_with_overrides(Some(dir.path())).unwrap();
        assert_eq!(
            specialist_instruction(&registry, Specialist::Planning).unwrap(),
            "Tu es un agent de planification pour le lycée."
        );

        let formatted = docs_formatter(&registry)
            .unwrap()
            .format(&[Document::new("svt-1", "texte")])
            .unwrap();
        assert_eq!(formatted, "[svt-1]");
    }

    #[test]
    fn test_broken_override_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("search_agent.j2"), "{% for %}").unwrap();
        assert!(registry_with_overrides(Some(dir.path())).is_err());
    }
}
