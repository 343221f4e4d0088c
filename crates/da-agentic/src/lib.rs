//! LLM-powered definition generation loop
//!
//! This crate drives the generate → validate → feedback cycle for Dutch
//! administrative definitions. It has no database dependencies - persistence
//! of accepted definitions stays in the application crate.
//!
//! ## Architecture
//!
//! ```text
//! ValidationContext → DefinitionGenerator → (LLM) → candidate text
//!        ↑                                              ↓
//!   FeedbackBuilder ← violations ← Validator (toets-core)
//! ```
//!
//! The `IterationController` bounds the cycle (default 3 iterations),
//! applies the acceptance gate and stagnation stop, and always returns the
//! best candidate it has seen.
//!
//! ## Backend Selection
//!
//! Set `AGENT_BACKEND`:
//! - `openai` (default): OpenAI API
//! - `anthropic`: Anthropic Claude API

// LLM client abstraction
pub mod anthropic_client;
pub mod backend;
pub mod client_factory;
pub mod llm_client;
pub mod openai_client;

// Generation loop
pub mod controller;
pub mod feedback;
pub mod generator;

// Re-exports for convenience
pub use backend::AgentBackend;
pub use client_factory::{create_llm_client, create_llm_client_with_key};
pub use controller::{
    CancellationFlag, IterationConfig, IterationController, IterationOutcome, IterationReport,
    IterationTrace,
};
pub use feedback::{FeedbackBuilder, FeedbackItem, FeedbackKind};
pub use generator::{DefinitionGenerator, GeneratedDefinition};
pub use llm_client::{ChatResponse, LlmClient, TokenUsage};
