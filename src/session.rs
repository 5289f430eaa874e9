//! Interview session and transcript models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::flow::ProgressState;

/// Coarse lifecycle marker for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Questions are being asked (or were answered but no document requested).
    Started,
    /// The user asked for the document.
    ReadyToGenerate,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Started => "started",
            Self::ReadyToGenerate => "ready_to_generate",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SessionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(Self::Started),
            "ready_to_generate" => Ok(Self::ReadyToGenerate),
            other => Err(format!("unknown session state: {other}")),
        }
    }
}

/// One user's interview: the resume document built so far and how far
/// through the questions they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: Uuid,
    /// Mirrors the session id until accounts exist.
    pub user_id: String,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub resume_data: Value,
    pub progress: ProgressState,
}

impl Session {
    /// A new session with an empty document, positioned at the first step.
    pub fn new(total_steps: usize) -> Self {
        let session_id = Uuid::new_v4();
        Self {
            session_id,
            user_id: session_id.to_string(),
            state: SessionState::Started,
            created_at: Utc::now(),
            resume_data: empty_document(),
            progress: ProgressState::new(total_steps),
        }
    }

    /// Throw away all answers and start the questions over.
    pub fn reset(&mut self, total_steps: usize) {
        self.state = SessionState::Started;
        self.resume_data = empty_document();
        self.progress = ProgressState::new(total_steps);
    }
}

/// A freshly allocated empty document. Never shared between sessions.
pub fn empty_document() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "user" => Self::User,
            _ => Self::Ai,
        }
    }
}

/// One line of a session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A finalized resume snapshot, saved when the document is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSnapshot {
    pub session_id: Uuid,
    pub resume_data: Value,
    pub generated_at: DateTime<Utc>,
}
