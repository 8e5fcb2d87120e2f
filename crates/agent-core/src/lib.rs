//! Core abstractions for the tutoring agents
//!
//! This crate defines the fundamental traits and types used throughout the
//! workspace: the [`Agent`] trait, the per-request [`Context`] (which also
//! tracks the delegation path), and the shared error taxonomy.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use context::Context;
pub use error::{Error, Result};
