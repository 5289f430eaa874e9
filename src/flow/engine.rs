//! Flow engine: validates an answer, normalizes it, writes it into the
//! session's document and advances progress.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::FlowConfig;
use crate::error::LlmError;
use crate::llm::Professionalizer;
use crate::session::Session;

use super::path;
use super::progress::Progress;
use super::registry::{Step, StepRegistry};
use super::rules::{Transform, split_list, split_sentences};
use super::state::FlowPhase;

/// What the caller should do after an answer was processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The answer was rejected. Ask the same question again with `error`.
    Retry { error: String, prompt: String },
    /// The answer was stored. Ask `prompt` next.
    Next { prompt: String },
    /// Every step has been answered.
    Done,
}

/// Drives sessions through a step registry.
pub struct FlowEngine {
    registry: Arc<StepRegistry>,
    professionalizer: Arc<dyn Professionalizer>,
    config: FlowConfig,
}

impl FlowEngine {
    pub fn new(
        registry: Arc<StepRegistry>,
        professionalizer: Arc<dyn Professionalizer>,
        config: FlowConfig,
    ) -> Self {
        Self {
            registry,
            professionalizer,
            config,
        }
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn first_prompt(&self) -> &str {
        self.registry.first_prompt()
    }

    /// Progress snapshot for display.
    pub fn progress(&self, session: &Session) -> Progress {
        Progress::of(&session.progress, &self.registry)
    }

    /// Process one answer for the session's current step.
    ///
    /// On `Retry` and on an already complete session, `session` is left
    /// untouched. Otherwise the answer is written and progress moves forward
    /// by exactly one step.
    pub async fn process_answer(&self, session: &mut Session, answer: &str) -> FlowOutcome {
        let index = session.progress.current_step;
        if session.progress.completed {
            return FlowOutcome::Done;
        }
        let Some(step) = self.registry.step_at(index) else {
            return FlowOutcome::Done;
        };

        let parsed = match step.rule().validate(answer) {
            Ok(value) => value,
            Err(e) => {
                debug!(
                    session_id = %session.session_id,
                    step = index,
                    error = %e,
                    "Answer rejected"
                );
                return FlowOutcome::Retry {
                    error: e.message,
                    prompt: step.prompt().to_string(),
                };
            }
        };

        let value = self.normalize(step, parsed).await;
        path::write(&mut session.resume_data, step.target(), value);

        let phase = session.progress.advance(self.registry.len());
        info!(
            session_id = %session.session_id,
            step = index,
            path = %step.target(),
            phase = %phase,
            "Answer stored"
        );

        match phase {
            FlowPhase::Complete => FlowOutcome::Done,
            FlowPhase::Collecting => match self.registry.step_at(session.progress.current_step) {
                Some(next) => FlowOutcome::Next {
                    prompt: next.prompt().to_string(),
                },
                None => FlowOutcome::Done,
            },
        }
    }

    async fn normalize(&self, step: &Step, value: Value) -> Value {
        let Value::String(text) = value else {
            return value;
        };

        match step.transform() {
            Transform::None => Value::String(text),
            Transform::List => Value::from(split_list(&text)),
            Transform::Sentences => Value::from(split_sentences(&text)),
            Transform::Professionalize => match self.rewrite(&text).await {
                Ok(rewritten) => Value::String(rewritten),
                Err(e) => {
                    warn!(path = %step.target(), error = %e, "Rewrite failed, keeping answer as typed");
                    Value::String(text)
                }
            },
        }
    }

    async fn rewrite(&self, text: &str) -> Result<String, LlmError> {
        let timeout = self.config.normalize_timeout;
        match tokio::time::timeout(timeout, self.professionalizer.professionalize(text)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                provider: "professionalizer".to_string(),
                timeout,
            }),
        }
    }
}
