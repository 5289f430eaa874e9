//! Answer rewriting. Turns a plain phrase into resume wording.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LlmError;

use super::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Best-effort text rewriting service used while normalizing answers.
///
/// Callers must treat any error as "keep the original text".
#[async_trait]
pub trait Professionalizer: Send + Sync {
    async fn professionalize(&self, text: &str) -> Result<String, LlmError>;
}

/// Rewrites text with a single LLM completion.
pub struct LlmProfessionalizer {
    llm: Arc<dyn LlmProvider>,
}

impl LlmProfessionalizer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Professionalizer for LlmProfessionalizer {
    async fn professionalize(&self, text: &str) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(rewrite_prompt(text))])
            .with_max_tokens(100)
            .with_temperature(0.7);
        let response = self.llm.complete(request).await?;

        clean_reply(&response.content).ok_or_else(|| LlmError::InvalidResponse {
            provider: self.llm.model_name().to_string(),
            reason: "empty rewrite".to_string(),
        })
    }
}

/// Passes text through unchanged. Used when no LLM is configured.
pub struct IdentityProfessionalizer;

#[async_trait]
impl Professionalizer for IdentityProfessionalizer {
    async fn professionalize(&self, text: &str) -> Result<String, LlmError> {
        Ok(text.to_string())
    }
}

/// Build the one-shot rewrite prompt.
pub fn rewrite_prompt(text: &str) -> String {
    format!(
        "Rewrite the following sentence to sound professional and more detailed, suitable for a resume.\n\
         Example:\n\
         Input: 'I deliver food'\n\
         Output: 'Worked as a Delivery Associate, ensuring timely and safe delivery of orders.'\n\
         \n\
         Input: '{text}'\n\
         Output:"
    )
}

/// Trim the model reply and drop an echoed `Output:` label.
fn clean_reply(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let cleaned = trimmed
        .strip_prefix("Output:")
        .map(str::trim_start)
        .unwrap_or(trimmed);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::llm::provider::{CompletionResponse, FinishReason};

    /// Returns a canned reply and records the prompt it was sent.
    struct CannedLlm {
        reply: String,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl LlmProvider for CannedLlm {
        fn model_name(&self) -> &str {
            "canned"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.seen.lock().unwrap().push(request);
            Ok(CompletionResponse {
                content: self.reply.clone(),
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
            })
        }
    }

    fn canned(reply: &str) -> Arc<CannedLlm> {
        Arc::new(CannedLlm {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn prompt_embeds_input() {
        let prompt = rewrite_prompt("I drive trucks");
        assert!(prompt.contains("Input: 'I drive trucks'"));
        assert!(prompt.ends_with("Output:"));
    }

    #[test]
    fn clean_reply_strips_label() {
        assert_eq!(
            clean_reply("  Output: Delivery Associate \n").as_deref(),
            Some("Delivery Associate")
        );
        assert_eq!(clean_reply("Warehouse Lead").as_deref(), Some("Warehouse Lead"));
        assert_eq!(clean_reply("   "), None);
        assert_eq!(clean_reply("Output:   "), None);
    }

    #[tokio::test]
    async fn llm_rewrite_uses_completion() {
        let llm = canned("Output: Senior Delivery Associate");
        let rewriter = LlmProfessionalizer::new(llm.clone());

        let result = rewriter.professionalize("driver").await.unwrap();
        assert_eq!(result, "Senior Delivery Associate");

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].max_tokens, Some(100));
        assert_eq!(seen[0].temperature, Some(0.7));
        assert!(seen[0].messages[0].content.contains("'driver'"));
    }

    #[tokio::test]
    async fn blank_rewrite_is_an_error() {
        let rewriter = LlmProfessionalizer::new(canned("  "));
        assert!(rewriter.professionalize("driver").await.is_err());
    }

    #[tokio::test]
    async fn identity_returns_input() {
        let result = IdentityProfessionalizer.professionalize("cook").await.unwrap();
        assert_eq!(result, "cook");
    }
}
