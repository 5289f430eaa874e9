//! LLM integration for answer normalization.
//!
//! `OpenAiProvider` speaks the chat-completions API over `reqwest`;
//! `Professionalizer` is the narrow seam the question flow depends on.

pub mod openai;
pub mod professionalize;
pub mod provider;

pub use openai::OpenAiProvider;
pub use professionalize::{IdentityProfessionalizer, LlmProfessionalizer, Professionalizer};
pub use provider::*;

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::LlmError;

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    pub model: String,
    pub base_url: String,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OpenAiProvider::new(
        config.api_key.clone(),
        config.model.clone(),
        config.base_url.clone(),
    )?;
    tracing::info!("Using OpenAI-compatible API (model: {})", config.model);
    Ok(Arc::new(provider))
}

/// Pick the answer rewriter for this server: LLM-backed when an API key is
/// configured, pass-through otherwise.
pub fn create_professionalizer(
    config: &ServerConfig,
) -> Result<Arc<dyn Professionalizer>, LlmError> {
    match &config.api_key {
        Some(api_key) => {
            let llm = create_provider(&LlmConfig {
                api_key: api_key.clone(),
                model: config.model.clone(),
                base_url: config.llm_base_url.clone(),
            })?;
            Ok(Arc::new(LlmProfessionalizer::new(llm)))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, job titles will be stored as typed");
            Ok(Arc::new(IdentityProfessionalizer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_constructs_without_network() {
        let config = LlmConfig {
            api_key: secrecy::SecretString::from("sk-test"),
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn no_key_falls_back_to_identity() {
        let config = ServerConfig::default();
        let rewriter = create_professionalizer(&config).unwrap();
        assert_eq!(rewriter.professionalize("welder").await.unwrap(), "welder");
    }
}
