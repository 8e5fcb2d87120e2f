//! Subcommand implementations

pub mod ask;
pub mod chat;
pub mod inspect;
pub mod route;
