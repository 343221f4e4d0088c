//! Agentic definition generation module
//!
//! Most functionality is in the `da-agentic` crate (no DB dependencies).
//! The orchestrator module stays here as it owns persistence.

// Re-export everything from da-agentic crate
pub use da_agentic::anthropic_client;
pub use da_agentic::backend;
pub use da_agentic::client_factory;
pub use da_agentic::controller;
pub use da_agentic::feedback;
pub use da_agentic::generator;
pub use da_agentic::llm_client;
pub use da_agentic::openai_client;

// Orchestrator stays local (has DB dependencies)
pub mod orchestrator;

// Re-export LLM client types
pub use da_agentic::{create_llm_client, create_llm_client_with_key};
pub use da_agentic::AgentBackend;
pub use da_agentic::LlmClient;

// Re-export loop types
pub use da_agentic::{
    CancellationFlag, FeedbackBuilder, FeedbackItem, FeedbackKind, IterationConfig,
    IterationController, IterationOutcome, IterationReport, IterationTrace,
};

// Re-export orchestrator
pub use orchestrator::{DefinitionOrchestrator, OrchestratorBuilder, OrchestratorResult};
