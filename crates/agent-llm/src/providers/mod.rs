//! Concrete completion backends

pub mod gemini;

pub use gemini::{GeminiConfig, GeminiEndpoint, GeminiProvider};
