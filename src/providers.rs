//! Chat provider implementations.

pub mod ollama;

// Re-export for convenience
pub use ollama::OllamaClient;
