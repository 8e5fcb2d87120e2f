//! Shared utilities for the tutoring agents
//!
//! This crate provides common functionality used across the workspace:
//! logging setup, environment-sourced configuration helpers and the
//! credential sources used by the Google Cloud clients.

pub mod auth;
pub mod config;
pub mod logging;

pub use auth::{
    AccessTokenSource, ApplicationDefaultCredentials, AuthError, GcloudCliToken, StaticToken,
};
pub use config::{ConfigError, EnvSource, ProcessEnv};
pub use logging::{init_tracing, init_tracing_with_default};
