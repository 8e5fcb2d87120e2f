//! Tutoring assistant for collège students
//!
//! Four specialist agents sit behind one orchestrator that reaches them
//! through agent-as-tool delegation:
//!
//! - `search_agent` looks things up in the school document store through
//!   the `retrieve_docs` tool
//! - `pedagogical_agent` explains concepts at the student's level
//! - `assessment_agent` writes quizzes and exercises
//! - `planning_agent` helps organise homework and revisions
//!
//! Which specialist handles a request is decided by the model, guided by
//! the orchestrator instruction. That instruction is rendered from a
//! [`RoutingPolicy`], which can also classify queries offline.
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_tutor::{TutorAssistant, TutorConfig, initialize};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let context = initialize(TutorConfig::from_env()?)?;
//!     let assistant = TutorAssistant::assemble(&context)?;
//!
//!     let answer = assistant
//!         .answer("Qu'est-ce que la photosynthèse ?", &TutorAssistant::session("demo"))
//!         .await;
//!     println!("{}", answer.text);
//!     Ok(())
//! }
//! ```

pub mod assistant;
pub mod config;
pub mod context;
pub mod error;
pub mod inspect;
pub mod prompts;
pub mod routing;
pub mod specialists;

pub use assistant::{ORCHESTRATOR_AGENT, TutorAnswer, TutorAssistant};
pub use config::{TutorConfig, TutorConfigBuilder};
pub use context::{ProcessContext, ProcessContextBuilder, initialize};
pub use error::{Result, TutorError};
pub use inspect::{StructureCheck, check_structure};
pub use routing::{Route, RouteDecision, RoutingPolicy};
pub use specialists::Specialist;
