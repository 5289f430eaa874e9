//! HTTP surface for the resume interview.

pub mod routes;

pub use routes::api_routes;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::flow::{FlowEngine, StepRegistry};
use crate::llm::create_professionalizer;
use crate::render::{MarkdownRenderer, ResumeRenderer};
use crate::store::{LibSqlBackend, SessionStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub engine: Arc<FlowEngine>,
    pub renderer: Arc<dyn ResumeRenderer>,
    pub locks: Arc<SessionLocks>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SessionStore>,
        engine: Arc<FlowEngine>,
        renderer: Arc<dyn ResumeRenderer>,
    ) -> Self {
        Self {
            store,
            engine,
            renderer,
            locks: Arc::new(SessionLocks::default()),
            started_at: Instant::now(),
        }
    }

    /// Wire the resume interview from configuration: the built-in question
    /// registry, the configured answer rewriter and the on-disk store.
    pub async fn from_config(config: &ServerConfig) -> Result<Self> {
        let registry = Arc::new(StepRegistry::resume()?);
        let professionalizer = create_professionalizer(config)?;
        let engine = Arc::new(FlowEngine::new(
            registry,
            professionalizer,
            config.flow.clone(),
        ));
        let store: Arc<dyn SessionStore> =
            Arc::new(LibSqlBackend::new_local(&config.db_path).await?);
        Ok(Self::new(store, engine, Arc::new(MarkdownRenderer)))
    }
}

/// One async mutex per session id.
///
/// Holding the guard serializes load → process → save for that session.
/// Entries nobody holds are dropped on the next acquire.
#[derive(Default)]
pub struct SessionLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub async fn acquire(&self, session_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.retain(|id, lock| *id == session_id || Arc::strong_count(lock) > 1);
            Arc::clone(map.entry(session_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of sessions currently tracked.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_session_waits() {
        let locks = Arc::new(SessionLocks::default());
        let id = Uuid::new_v4();

        let guard = locks.acquire(id).await;
        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_sessions_do_not_block() {
        let locks = SessionLocks::default();
        let _a = locks.acquire(Uuid::new_v4()).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(Uuid::new_v4())).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn from_config_opens_store() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            db_path: tmp.path().join("data").join("resume.db"),
            ..ServerConfig::default()
        };

        let state = AppState::from_config(&config).await.unwrap();
        assert_eq!(state.engine.registry().len(), 13);
        assert!(config.db_path.exists());
        assert!(state.store.get_session(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn from_config_reports_unopenable_store() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let config = ServerConfig {
            db_path: blocker.join("resume.db"),
            ..ServerConfig::default()
        };

        let err = AppState::from_config(&config).await.err().unwrap();
        assert!(matches!(err, crate::error::Error::Database(_)));
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = SessionLocks::default();
        for _ in 0..5 {
            let _guard = locks.acquire(Uuid::new_v4()).await;
        }
        let _held = locks.acquire(Uuid::new_v4()).await;
        assert_eq!(locks.len().await, 1);
    }
}
