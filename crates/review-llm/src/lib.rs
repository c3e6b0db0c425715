//! review-llm
//!
//! `GenerationGateway` over the Ollama `/api/generate` endpoint.

pub mod ollama;

pub use ollama::OllamaGateway;
