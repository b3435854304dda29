//! Database migrations

use crate::error::Result;
use crate::models::EntityKind;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }
    if version < 2 {
        migrate_v2(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Run `statements` in one transaction, rolling back on the first failure
async fn apply(conn: &Connection, statements: &[String]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt.as_str(), ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    Ok(())
}

/// Schema for one mirrored entity table.
///
/// Indexed columns are denormalized from the JSON payload so the common
/// dashboard queries (by status, owning app, owner, sync state, age) stay
/// cheap. `is_deleted` marks tombstones awaiting remote confirmation.
fn entity_table_statements(kind: EntityKind) -> Vec<String> {
    let table = kind.table_name();
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                app_id TEXT,
                status TEXT,
                data TEXT NOT NULL,
                synced INTEGER NOT NULL DEFAULT 0,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"
        ),
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_status ON {table}(status)"),
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_app_id ON {table}(app_id)"),
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_user_id ON {table}(user_id)"),
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_synced ON {table}(synced)"),
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_created ON {table}(created_at DESC)"),
    ]
}

/// Migration to version 1: entity mirrors and the operation log
async fn migrate_v1(conn: &Connection) -> Result<()> {
    let mut statements = vec!["CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )"
    .to_string()];

    for kind in EntityKind::ALL {
        statements.extend(entity_table_statements(kind));
    }

    statements.extend([
        "CREATE TABLE IF NOT EXISTS sync_queue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            table_name TEXT NOT NULL,
            action TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            timestamp TEXT NOT NULL
        )"
        .to_string(),
        "CREATE INDEX IF NOT EXISTS idx_sync_queue_table ON sync_queue(table_name)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_sync_queue_action ON sync_queue(action)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_sync_queue_timestamp ON sync_queue(timestamp)"
            .to_string(),
        "CREATE INDEX IF NOT EXISTS idx_sync_queue_entity ON sync_queue(table_name, entity_id)"
            .to_string(),
        "INSERT INTO schema_version (version) VALUES (1)".to_string(),
    ]);

    apply(conn, &statements).await?;
    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: persisted response caches for the cache worker
async fn migrate_v2(conn: &Connection) -> Result<()> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS cache_entries (
            cache_name TEXT NOT NULL,
            request_key TEXT NOT NULL,
            status INTEGER NOT NULL,
            headers TEXT NOT NULL,
            body BLOB NOT NULL,
            stored_at TEXT NOT NULL,
            PRIMARY KEY (cache_name, request_key)
        )"
        .to_string(),
        "CREATE INDEX IF NOT EXISTS idx_cache_entries_key ON cache_entries(request_key)"
            .to_string(),
        "INSERT INTO schema_version (version) VALUES (2)".to_string(),
    ];

    apply(conn, &statements).await?;
    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
