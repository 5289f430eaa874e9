//! `SessionStore` trait: async persistence for interview sessions.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::session::{ChatEntry, ResumeSnapshot, Sender, Session};

/// Backend-agnostic storage for sessions, transcripts and resume snapshots.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Sessions ────────────────────────────────────────────────────

    /// Insert a new session.
    async fn insert_session(&self, session: &Session) -> Result<(), DatabaseError>;

    /// Load a session by id.
    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, DatabaseError>;

    /// Overwrite a stored session's state, document and progress.
    ///
    /// Returns `DatabaseError::NotFound` if the session was never inserted.
    async fn save_session(&self, session: &Session) -> Result<(), DatabaseError>;

    // ── Transcript ──────────────────────────────────────────────────

    /// Append a line to a session's transcript.
    async fn add_message(
        &self,
        session_id: Uuid,
        sender: Sender,
        text: &str,
    ) -> Result<(), DatabaseError>;

    /// A session's transcript, oldest first.
    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<ChatEntry>, DatabaseError>;

    // ── Resumes ─────────────────────────────────────────────────────

    /// Save (or replace) the finalized resume for a session.
    async fn save_resume(&self, session_id: Uuid, resume: &Value) -> Result<(), DatabaseError>;

    /// The finalized resume for a session, if one was generated.
    async fn get_resume(&self, session_id: Uuid) -> Result<Option<ResumeSnapshot>, DatabaseError>;
}
