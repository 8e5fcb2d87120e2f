//! The four specialist agents

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A specialist the orchestrator can delegate to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialist {
    /// Document search with source citations
    Search,
    /// Explanations adapted to the student's level
    Pedagogical,
    /// Quizzes, exercises and feedback
    Assessment,
    /// Homework and revision planning
    Planning,
}

impl Specialist {
    /// Every specialist, in the order the orchestrator lists them
    pub const ALL: [Specialist; 4] = [
        Specialist::Search,
        Specialist::Pedagogical,
        Specialist::Assessment,
        Specialist::Planning,
    ];

    /// Agent name, also the delegation tool name
    pub fn agent_name(self) -> &'static str {
        match self {
            Self::Search => "search_agent",
            Self::Pedagogical => "pedagogical_agent",
            Self::Assessment => "assessment_agent",
            Self::Planning => "planning_agent",
        }
    }

    /// Description shown to the orchestrator's model
    pub fn description(self) -> &'static str {
        match self {
            Self::Search => {
                "Agent spécialisé dans la recherche documentaire. \
                 Utilise cet agent pour chercher des informations dans les documents, \
                 trouver des sources, ou vérifier des faits."
            }
            Self::Pedagogical => {
                "Agent pédagogique spécialisé pour les élèves de collège. \
                 Utilise cet agent pour expliquer des concepts de manière claire et adaptée, \
                 avec des exemples concrets et des analogies."
            }
            Self::Assessment => {
                "Agent d'évaluation spécialisé dans la création d'exercices et de quiz. \
                 Utilise cet agent pour créer des quiz, des exercices, \
                 ou évaluer les connaissances d'un élève."
            }
            Self::Planning => {
                "Agent de planification et organisation scolaire. \
                 Utilise cet agent pour aider à organiser les révisions, \
                 créer un planning d'étude, ou donner des conseils méthodologiques."
            }
        }
    }

    /// Word every instruction for this specialist must mention
    pub fn instruction_keyword(self) -> &'static str {
        match self {
            Self::Search => "recherche",
            Self::Pedagogical => "pédagogique",
            Self::Assessment => "évaluation",
            Self::Planning => "planification",
        }
    }

    /// Whether the specialist gets the `retrieve_docs` tool
    pub fn uses_retrieval(self) -> bool {
        matches!(self, Self::Search)
    }
}

impl fmt::Display for Specialist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.agent_name())
    }
}

impl FromStr for Specialist {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|specialist| specialist.agent_name() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|s| s.agent_name()).collect();
                format!("unknown specialist '{s}' (expected one of {})", known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for specialist in Specialist::ALL {
            assert_eq!(specialist.agent_name().parse::<Specialist>(), Ok(specialist));
        }
        let err = "math_agent".parse::<Specialist>().unwrap_err();
        assert!(err.contains("search_agent"));
    }

    #[test]
    fn test_only_search_retrieves() {
        let retrieving: Vec<_> = Specialist::ALL.into_iter().filter(|s| s.uses_retrieval()).collect();
        assert_eq!(retrieving, [Specialist::Search]);
    }

    #[test]
    fn test_descriptions_are_distinct() {
        let mut descriptions: Vec<_> = Specialist::ALL.iter().map(|s| s.description()).collect();
        descriptions.dedup();
        assert_eq!(descriptions.len(), 4);
        assert!(Specialist::Search.description().starts_with("Agent spécialisé dans la recherche"));
    }
}
