//! Structural checks over an assembled assistant
//!
//! These are the properties a deployment must hold before it takes
//! traffic: five agents, an orchestrator at the root that reaches exactly
//! the four specialists, instructions that say what each agent is for, and
//! document search wired to the search specialist only.

use crate::assistant::{ORCHESTRATOR_AGENT, TutorAssistant};
use crate::specialists::Specialist;
use agent_core::Agent;
use agent_retrieval::RETRIEVE_DOCS;
use agent_tools::ToolKind;
use serde::Serialize;

/// Shortest instruction considered meaningful
pub const MIN_INSTRUCTION_CHARS: usize = 50;

const ORCHESTRATOR_KEYWORD: &str = "orchestrateur";

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureCheck {
    /// What was checked
    pub name: String,
    /// Whether it holds
    pub passed: bool,
    /// What was observed
    pub detail: String,
}

impl StructureCheck {
    fn new(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

/// Run every structural check against `assistant`
pub fn check_structure(assistant: &TutorAssistant) -> Vec<StructureCheck> {
    let mut checks = Vec::new();
    let agents = assistant.agents();

    checks.push(StructureCheck::new(
        "agent count",
        agents.len() == Specialist::ALL.len() + 1,
        format!("{} agents", agents.len()),
    ));

    let root = assistant.root_agent();
    checks.push(StructureCheck::new(
        "root agent",
        root.name() == ORCHESTRATOR_AGENT,
        root.name(),
    ));

    let delegates: Vec<&str> = root
        .tools()
        .list_tools()
        .iter()
        .filter(|t| t.kind() == ToolKind::Agent)
        .map(|t| t.name())
        .collect();
    let expected: Vec<&str> = Specialist::ALL.iter().map(|s| s.agent_name()).collect();
    checks.push(StructureCheck::new(
        "orchestrator delegates",
        delegates == expected && root.tools().len() == expected.len(),
        delegates.join(", "),
    ));

    checks.push(instruction_check(
        root.name(),
        root.instruction(),
        ORCHESTRATOR_KEYWORD,
    ));
    for specialist in Specialist::ALL {
        match assistant.specialist(specialist) {
            Some(agent) => checks.push(instruction_check(
                agent.name(),
                agent.instruction(),
                specialist.instruction_keyword(),
            )),
            None => checks.push(StructureCheck::new(
                format!("{specialist} instruction"),
                false,
                "agent missing",
            )),
        }
    }

    let retrieving: Vec<&str> = agents
        .iter()
        .filter(|a| a.tools().contains(RETRIEVE_DOCS))
        .map(|a| a.name())
        .collect();
    checks.push(StructureCheck::new(
        "document search",
        retrieving == [Specialist::Search.agent_name()],
        if retrieving.is_empty() {
            "no agent".to_string()
        } else {
            retrieving.join(", ")
        },
    ));

    checks
}

fn instruction_check(agent: &str, instruction: &str, keyword: &str) -> StructureCheck {
    let chars = instruction.chars().count();
    let passed = chars > MIN_INSTRUCTION_CHARS && instruction.to_lowercase().contains(keyword);
    StructureCheck::new(
        format!("{agent} instruction"),
        passed,
        format!("{chars} chars, mentions '{keyword}': {}", instruction.to_lowercase().contains(keyword)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProcessContext, TutorConfig};
    use agent_llm::testing::ScriptedProvider;
    use agent_retrieval::{IdentityReranker, InMemoryRetriever};
    use std::sync::Arc;

    #[test]
    fn test_builtin_assembly_passes() {
        let context = ProcessContext::builder(TutorConfig::builder().project_id("p").build().unwrap())
            .provider(Arc::new(ScriptedProvider::replying("ok")))
            .retriever(Arc::new(InMemoryRetriever::default()))
            .reranker(Arc::new(IdentityReranker))
            .build()
            .unwrap();
        let assistant = TutorAssistant::assemble(&context).unwrap();

        let checks = check_structure(&assistant);
        assert_eq!(checks.len(), 9);
        for check in &checks {
            assert!(check.passed, "{}: {}", check.name, check.detail);
        }
        assert_eq!(checks[5].name, "pedagogical_agent instruction");
        assert_eq!(checks[8].detail, "search_agent");
    }

    #[test]
    fn test_vague_instruction_fails() {
        let check = instruction_check("planning_agent", "Tu aides les élèves.", "planification");
        assert!(!check.passed);
        assert!(check.detail.starts_with("20 chars"));
    }
}
