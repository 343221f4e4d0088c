//! LLM Client Factory
//!
//! Creates the configured `LlmClient` implementation based on the
//! `AGENT_BACKEND` environment variable.

use std::sync::Arc;

use anyhow::Result;

use crate::anthropic_client::AnthropicClient;
use crate::backend::AgentBackend;
use crate::llm_client::LlmClient;
use crate::openai_client::OpenAiClient;

/// The backend the process is currently configured for.
pub fn current_backend() -> AgentBackend {
    AgentBackend::from_env().unwrap_or_default()
}

/// Create an LLM client from environment variables.
///
/// Reads `AGENT_BACKEND` for provider selection and the provider's own
/// `*_API_KEY` / `*_MODEL` variables.
pub fn create_llm_client() -> Result<Arc<dyn LlmClient>> {
    let backend = AgentBackend::from_env()?;
    let client: Arc<dyn LlmClient> = match backend {
        AgentBackend::OpenAi => Arc::new(OpenAiClient::from_env()?),
        AgentBackend::Anthropic => Arc::new(AnthropicClient::from_env()?),
    };
    Ok(client)
}

/// Create an LLM client for the configured backend with an explicit API key.
pub fn create_llm_client_with_key(api_key: String) -> Result<Arc<dyn LlmClient>> {
    let backend = AgentBackend::from_env()?;
    let client: Arc<dyn LlmClient> = match backend {
        AgentBackend::OpenAi => Arc::new(OpenAiClient::new(api_key)),
        AgentBackend::Anthropic => Arc::new(AnthropicClient::new(api_key)),
    };
    Ok(client)
}
