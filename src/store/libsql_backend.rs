//! libSQL backend: async `SessionStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::flow::ProgressState;
use crate::session::{ChatEntry, ResumeSnapshot, Sender, Session};
use crate::store::migrations;
use crate::store::traits::SessionStore;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::Serialization(format!("bad uuid '{s}': {e}")))
}

fn parse_json(s: &str) -> Result<Value, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn to_json(value: &Value) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

/// Map a libsql Row to a Session.
///
/// Column order matches SESSION_COLUMNS:
/// 0:id, 1:user_id, 2:state, 3:resume_data, 4:current_step, 5:total_steps,
/// 6:completed, 7:created_at
fn row_to_session(row: &libsql::Row) -> Result<Session, DatabaseError> {
    let get_err = |e: libsql::Error| DatabaseError::Query(format!("read session row: {e}"));

    let id_str: String = row.get(0).map_err(get_err)?;
    let user_id: String = row.get(1).map_err(get_err)?;
    let state_str: String = row.get(2).map_err(get_err)?;
    let data_str: String = row.get(3).map_err(get_err)?;
    let current_step: i64 = row.get(4).map_err(get_err)?;
    let total_steps: i64 = row.get(5).map_err(get_err)?;
    let completed: i64 = row.get(6).map_err(get_err)?;
    let created_str: String = row.get(7).map_err(get_err)?;

    Ok(Session {
        session_id: parse_uuid(&id_str)?,
        user_id,
        state: state_str.parse().map_err(DatabaseError::Serialization)?,
        created_at: parse_datetime(&created_str),
        resume_data: parse_json(&data_str)?,
        progress: ProgressState {
            current_step: current_step.max(0) as usize,
            total_steps: total_steps.max(0) as usize,
            completed: completed != 0,
        },
    })
}

// ── Trait implementation ────────────────────────────────────────────

const SESSION_COLUMNS: &str =
    "id, user_id, state, resume_data, current_step, total_steps, completed, created_at";

#[async_trait]
impl SessionStore for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Sessions ────────────────────────────────────────────────────

    async fn insert_session(&self, session: &Session) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO sessions (id, user_id, state, resume_data, current_step, total_steps, completed, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                session.session_id.to_string(),
                session.user_id.as_str(),
                session.state.to_string(),
                to_json(&session.resume_data)?,
                session.progress.current_step as i64,
                session.progress.total_steps as i64,
                i64::from(session.progress.completed),
                session.created_at.to_rfc3339(),
                now
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("insert_session: {e}")))?;

        debug!(session_id = %session.session_id, "Session inserted");
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_session: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_session(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_session: {e}"))),
        }
    }

    async fn save_session(&self, session: &Session) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let count = conn
            .execute(
                "UPDATE sessions
                 SET state = ?2, resume_data = ?3, current_step = ?4, total_steps = ?5,
                     completed = ?6, updated_at = ?7
                 WHERE id = ?1",
                params![
                    session.session_id.to_string(),
                    session.state.to_string(),
                    to_json(&session.resume_data)?,
                    session.progress.current_step as i64,
                    session.progress.total_steps as i64,
                    i64::from(session.progress.completed),
                    now
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_session: {e}")))?;

        if count == 0 {
            return Err(DatabaseError::NotFound {
                entity: "session".to_string(),
                id: session.session_id.to_string(),
            });
        }
        Ok(())
    }

    // ── Transcript ──────────────────────────────────────────────────

    async fn add_message(
        &self,
        session_id: Uuid,
        sender: Sender,
        text: &str,
    ) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO messages (id, session_id, sender, text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Uuid::new_v4().to_string(),
                session_id.to_string(),
                sender.as_str(),
                text,
                now
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("add_message: {e}")))?;
        Ok(())
    }

    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<ChatEntry>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                "SELECT id, sender, text, created_at FROM messages
                 WHERE session_id = ?1 ORDER BY seq ASC",
                params![session_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_messages: {e}")))?;

        let mut messages = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let id_str: String = row.get(0).unwrap_or_default();
            let sender: String = row.get(1).unwrap_or_default();
            let text: String = row.get(2).unwrap_or_default();
            let created_str: String = row.get(3).unwrap_or_default();
            messages.push(ChatEntry {
                id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
                session_id,
                sender: Sender::parse(&sender),
                text,
                created_at: parse_datetime(&created_str),
            });
        }
        Ok(messages)
    }

    // ── Resumes ─────────────────────────────────────────────────────

    async fn save_resume(&self, session_id: Uuid, resume: &Value) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO resumes (session_id, resume_data, generated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (session_id) DO UPDATE SET resume_data = ?2, generated_at = ?3",
            params![session_id.to_string(), to_json(resume)?, now],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("save_resume: {e}")))?;

        info!(session_id = %session_id, "Resume snapshot saved");
        Ok(())
    }

    async fn get_resume(&self, session_id: Uuid) -> Result<Option<ResumeSnapshot>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                "SELECT resume_data, generated_at FROM resumes WHERE session_id = ?1",
                params![session_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_resume: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let data_str: String = row.get(0).unwrap_or_else(|_| "{}".to_string());
                let generated_str: String = row.get(1).unwrap_or_default();
                Ok(Some(ResumeSnapshot {
                    session_id,
                    resume_data: parse_json(&data_str)?,
                    generated_at: parse_datetime(&generated_str),
                }))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_resume: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::session::SessionState;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    #[tokio::test]
    async fn insert_and_get_session() {
        let db = test_db().await;
        let session = Session::new(13);
        db.insert_session(&session).await.unwrap();

        let fetched = db.get_session(session.session_id).await.unwrap().unwrap();
        assert_eq!(fetched.session_id, session.session_id);
        assert_eq!(fetched.user_id, session.user_id);
        assert_eq!(fetched.state, SessionState::Started);
        assert_eq!(fetched.resume_data, json!({}));
        assert_eq!(fetched.progress, ProgressState::new(13));
    }

    #[tokio::test]
    async fn get_session_not_found() {
        let db = test_db().await;
        assert!(db.get_session(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_session_persists_document_and_progress() {
        let db = test_db().await;
        let mut session = Session::new(13);
        db.insert_session(&session).await.unwrap();

        session.resume_data = json!({"workExperience": [{"jobTitle": "Cook", "yearsWorked": 3}]});
        session.progress.advance(13);
        session.state = SessionState::ReadyToGenerate;
        db.save_session(&session).await.unwrap();

        let fetched = db.get_session(session.session_id).await.unwrap().unwrap();
        assert_eq!(fetched.resume_data, session.resume_data);
        assert_eq!(fetched.progress.current_step, 1);
        assert_eq!(fetched.state, SessionState::ReadyToGenerate);
    }

    #[tokio::test]
    async fn save_unknown_session_is_not_found() {
        let db = test_db().await;
        let err = db.save_session(&Session::new(13)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let db = test_db().await;
        let mut a = Session::new(13);
        let b = Session::new(13);
        db.insert_session(&a).await.unwrap();
        db.insert_session(&b).await.unwrap();

        a.resume_data = json!({"skills": ["welding"]});
        db.save_session(&a).await.unwrap();

        let fetched_b = db.get_session(b.session_id).await.unwrap().unwrap();
        assert_eq!(fetched_b.resume_data, json!({}));
    }

    #[tokio::test]
    async fn transcript_keeps_order() {
        let db = test_db().await;
        let session = Session::new(13);
        db.insert_session(&session).await.unwrap();

        db.add_message(session.session_id, Sender::Ai, "What is your full name?")
            .await
            .unwrap();
        db.add_message(session.session_id, Sender::User, "Maria")
            .await
            .unwrap();
        db.add_message(session.session_id, Sender::Ai, "What is your phone number?")
            .await
            .unwrap();

        let messages = db.list_messages(session.session_id).await.unwrap();
        let lines: Vec<(Sender, &str)> =
            messages.iter().map(|m| (m.sender, m.text.as_str())).collect();
        assert_eq!(
            lines,
            vec![
                (Sender::Ai, "What is your full name?"),
                (Sender::User, "Maria"),
                (Sender::Ai, "What is your phone number?"),
            ]
        );
        assert!(db.list_messages(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resume_snapshot_upserts() {
        let db = test_db().await;
        let session = Session::new(13);
        db.insert_session(&session).await.unwrap();
        assert!(db.get_resume(session.session_id).await.unwrap().is_none());

        db.save_resume(session.session_id, &json!({"skills": ["a"]}))
            .await
            .unwrap();
        db.save_resume(session.session_id, &json!({"skills": ["b"]}))
            .await
            .unwrap();

        let snapshot = db.get_resume(session.session_id).await.unwrap().unwrap();
        assert_eq!(snapshot.resume_data, json!({"skills": ["b"]}));
    }

    #[tokio::test]
    async fn open_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("dir").join("resume.db");
        let db = LibSqlBackend::new_local(&db_path).await.unwrap();
        assert!(db_path.exists());

        let session = Session::new(13);
        db.insert_session(&session).await.unwrap();
        assert!(db.get_session(session.session_id).await.unwrap().is_some());
    }
}
