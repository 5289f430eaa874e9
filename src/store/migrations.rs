//! Schema versions for the session store.
//!
//! V1 holds sessions and their transcripts. V2 adds finalized resume
//! snapshots. The highest applied version is kept in `_migrations`.

use libsql::Connection;
use tracing::info;

use crate::error::DatabaseError;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                state TEXT NOT NULL DEFAULT 'started',
                resume_data TEXT NOT NULL DEFAULT '{}',
                current_step INTEGER NOT NULL DEFAULT 0,
                total_steps INTEGER NOT NULL DEFAULT 0,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

            CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
                sender TEXT NOT NULL,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id);
        "#,
    },
    Migration {
        version: 2,
        name: "resume_snapshots",
        sql: r#"
            CREATE TABLE IF NOT EXISTS resumes (
                session_id TEXT PRIMARY KEY REFERENCES sessions(id) ON DELETE CASCADE,
                resume_data TEXT NOT NULL,
                generated_at TEXT NOT NULL
            );
        "#,
    },
];

/// Bring the schema up to the latest version.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("create _migrations: {e}")))?;

    let applied = applied_version(conn).await?;
    let pending = MIGRATIONS.iter().filter(|m| m.version > applied);

    let mut latest = applied;
    for migration in pending {
        info!(version = migration.version, name = migration.name, "Upgrading session schema");
        conn.execute_batch(migration.sql).await.map_err(|e| {
            DatabaseError::Migration(format!("V{} {}: {e}", migration.version, migration.name))
        })?;
        record(conn, migration).await?;
        latest = migration.version;
    }

    if latest == applied {
        info!(version = latest, "Session schema up to date");
    }
    Ok(())
}

/// Highest version recorded in `_migrations`, 0 for a fresh database.
async fn applied_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("read schema version: {e}")))?;

    match rows.next().await {
        Ok(Some(row)) => row
            .get::<i64>(0)
            .map_err(|e| DatabaseError::Migration(format!("read schema version: {e}"))),
        Ok(None) => Ok(0),
        Err(e) => Err(DatabaseError::Migration(format!("read schema version: {e}"))),
    }
}

async fn record(conn: &Connection, migration: &Migration) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![migration.version, migration.name],
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("record V{}: {e}", migration.version)))?;
    Ok(())
}
