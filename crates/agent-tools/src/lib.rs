//! Tool framework for the tutoring agents
//!
//! Tools are the capabilities an agent may invoke during its completion
//! loop: either a plain function ([`FunctionTool`]) or, in `agent-runtime`,
//! another agent wrapped for delegation.

pub mod function;
pub mod invocation;
pub mod registry;
pub mod tool;

pub use function::FunctionTool;
pub use invocation::{InvocationOutcome, ToolInvocation};
pub use registry::{ToolRegistry, validate_identifier};
pub use tool::{Tool, ToolKind, ToolOutput};
