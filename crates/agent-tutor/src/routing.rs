//! Routing policy
//!
//! The policy maps intents to specialists with French trigger keywords and
//! an example request each. It is data: the orchestrator instruction is
//! rendered from it, and [`RoutingPolicy::classify`] applies it offline so
//! routing expectations can be regression-tested without a backend. At run
//! time the model, not this classifier, picks the specialist.

use crate::error::{Result, TutorError};
use crate::specialists::Specialist;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

const BUILTIN_POLICY: &str = include_str!("../policy/routing.json");

/// One intent handled by one specialist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Short intent identifier
    pub intent: String,
    /// Specialist agent name
    pub agent: String,
    /// Heading shown in the orchestrator instruction
    pub title: String,
    /// When to delegate, in the model's words
    pub when: String,
    /// Typical student request
    pub example: String,
    /// Need this route covers, for the strategy list
    pub strategy: String,
    /// Specialists worth consulting as well
    #[serde(default)]
    pub combine_with: Vec<String>,
    /// Accent-free, lower-case trigger words or phrases
    pub keywords: Vec<String>,
}

/// Offline classification result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Small talk the orchestrator answers itself
    Direct,
    /// A specialist should handle the request
    Delegate {
        intent: String,
        agent: String,
        matched: Vec<String>,
    },
    /// Nothing matched; left to the model
    Open,
}

impl RouteDecision {
    /// Delegated agent, if any
    pub fn agent(&self) -> Option<&str> {
        match self {
            Self::Delegate { agent, .. } => Some(agent),
            _ => None,
        }
    }
}

/// Versioned intent-to-specialist mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    /// Policy version, logged at startup
    pub version: String,
    /// Triggers for answering without delegation
    #[serde(default)]
    pub direct_answer_keywords: Vec<String>,
    /// Routes in priority order
    pub routes: Vec<Route>,
}

impl RoutingPolicy {
    /// The policy shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_POLICY)
    }

    /// Parse and validate a JSON policy
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(json)
            .map_err(|e| TutorError::RoutingPolicy(format!("invalid JSON: {e}")))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load a JSON policy file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| TutorError::RoutingPolicy(format!("cannot read {}: {e}", path.display())))?;
        let policy = Self::from_json(&json)?;
        debug!(path = %path.display(), version = %policy.version, "Routing policy loaded");
        Ok(policy)
    }

    /// Check that every route targets a known specialist
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(TutorError::RoutingPolicy("version must not be empty".to_string()));
        }
        if self.routes.is_empty() {
            return Err(TutorError::RoutingPolicy("at least one route is required".to_string()));
        }

        let mut intents = HashSet::new();
        for route in &self.routes {
            if !intents.insert(route.intent.as_str()) {
                return Err(TutorError::RoutingPolicy(format!(
                    "intent '{}' is declared more than once",
                    route.intent
                )));
            }
            for agent in std::iter::once(&route.agent).chain(&route.combine_with) {
                agent
                    .parse::<Specialist>()
                    .map_err(|e| TutorError::RoutingPolicy(format!("route '{}': {e}", route.intent)))?;
            }
            if route.keywords.iter().all(|k| normalize(k).is_empty()) {
                return Err(TutorError::RoutingPolicy(format!(
                    "route '{}' has no keywords",
                    route.intent
                )));
            }
        }
        Ok(())
    }

    /// Route for `agent`, if the policy has one
    pub fn route_for(&self, agent: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.agent == agent)
    }

    /// Classify `query` the way the orchestrator is instructed to
    ///
    /// The route with the most keyword hits wins, ties going to the earlier
    /// route. Small-talk triggers only apply when no route matches.
    pub fn classify(&self, query: &str) -> RouteDecision {
        let text = padded(query);

        let mut best: Option<(&Route, Vec<String>)> = None;
        for route in &self.routes {
            let hits = matches(&text, &route.keywords);
            if hits.len() > best.as_ref().map_or(0, |(_, top)| top.len()) {
                best = Some((route, hits));
            }
        }

        if let Some((route, matched)) = best {
            return RouteDecision::Delegate {
                intent: route.intent.clone(),
                agent: route.agent.clone(),
                matched,
            };
        }
        if matches(&text, &self.direct_answer_keywords).is_empty() {
            RouteDecision::Open
        } else {
            RouteDecision::Direct
        }
    }
}

fn matches(text: &str, keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| normalize(k))
        .filter(|k| !k.is_empty() && text.contains(&format!(" {k} ")))
        .collect()
}

fn padded(text: &str) -> String {
    format!(" {} ", normalize(text))
}

/// Lower-case, strip French diacritics, collapse everything that is not a
/// letter or digit into single spaces
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        let folded = match c {
            'à' | 'â' | 'ä' => "a",
            'é' | 'è' | 'ê' | 'ë' => "e",
            'î' | 'ï' => "i",
            'ô' | 'ö' => "o",
            'ù' | 'û' | 'ü' => "u",
            'ÿ' => "y",
            'ç' => "c",
            'œ' => "oe",
            'æ' => "ae",
            c if c.is_alphanumeric() => {
                out.push(c);
                continue;
            }
            _ => " ",
        };
        if folded == " " && (out.is_empty() || out.ends_with(' ')) {
            continue;
        }
        out.push_str(folded);
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RoutingPolicy {
        RoutingPolicy::builtin().unwrap()
    }

    #[test]
    fn test_builtin_policy_is_valid() {
        let policy = policy();
        let agents: Vec<_> = policy.routes.iter().map(|r| r.agent.as_str()).collect();
        assert_eq!(
            agents,
            ["search_agent", "pedagogical_agent", "assessment_agent", "planning_agent"]
        );
        assert_eq!(policy.route_for("pedagogical_agent").unwrap().combine_with, ["search_agent"]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Qu'est-ce que la Photosynthèse ?"), "qu est ce que la photosynthese");
        assert_eq!(normalize("  Révisions  du  brevet!"), "revisions du brevet");
        assert_eq!(normalize("cœur"), "coeur");
    }

    #[test]
    fn test_reference_requests() {
        let policy = policy();
        assert_eq!(policy.classify("Qu'est-ce que la photosynthèse ?").agent(), Some("search_agent"));
        assert_eq!(policy.classify("Explique-moi les fractions").agent(), Some("pedagogical_agent"));
        assert_eq!(policy.classify("Crée un quiz sur les fractions").agent(), Some("assessment_agent"));
        assert_eq!(policy.classify("Organise mes révisions").agent(), Some("planning_agent"));
    }

    #[test]
    fn test_small_talk_answered_directly() {
        let policy = policy();
        assert_eq!(policy.classify("bonjour"), RouteDecision::Direct);
        assert_eq!(policy.classify("Merci beaucoup !"), RouteDecision::Direct);
        // A real request wins over a greeting
        assert_eq!(
            policy.classify("Bonjour, crée un quiz sur Napoléon").agent(),
            Some("assessment_agent")
        );
    }

    #[test]
    fn test_unmatched_is_open() {
        assert_eq!(policy().classify("La Loire"), RouteDecision::Open);
    }

    #[test]
    fn test_keywords_match_whole_words() {
        // "sources" must not trigger on "ressources"
        let decision = policy().classify("ressources naturelles");
        assert_eq!(decision, RouteDecision::Open);
    }

    #[test]
    fn test_matched_keywords_reported() {
        match policy().classify("Je veux m'entraîner avec un QCM") {
            RouteDecision::Delegate { intent, matched, .. } => {
                assert_eq!(intent, "assessment");
                assert_eq!(matched, ["qcm", "entrainer"]);
            }
            other => panic!("expected delegation, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_policies_rejected() {
        let unknown_agent = r#"{"version": "1", "routes": [{"intent": "maths", "agent": "math_agent",
            "title": "t", "when": "w", "example": "e", "strategy": "s", "keywords": ["calcul"]}]}"#;
        let err = RoutingPolicy::from_json(unknown_agent).unwrap_err();
        assert!(err.to_string().contains("math_agent"));

        let bad_combine = r#"{"version": "1", "routes": [{"intent": "x", "agent": "search_agent",
            "title": "t", "when": "w", "example": "e", "strategy": "s", "combine_with": ["nobody"],
            "keywords": ["cherche"]}]}"#;
        assert!(RoutingPolicy::from_json(bad_combine).is_err());

        let no_routes = r#"{"version": "1", "routes": []}"#;
        assert!(RoutingPolicy::from_json(no_routes).is_err());

        assert!(RoutingPolicy::from_json("not json").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routing.json");
        std::fs::write(&path, BUILTIN_POLICY).unwrap();

        assert_eq!(RoutingPolicy::from_file(&path).unwrap(), policy());
        assert!(RoutingPolicy::from_file(dir.path().join("absent.json")).is_err());
    }
}
