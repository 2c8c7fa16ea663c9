//! Database schema migrations.
//!
//! Applies the initial schema: `policies` (the relational half of C1)
//! and `chunks` (the scroll/BM25 source for C1/C2).

use rusqlite::Connection;
use tracing::info;

use qa_core::error::QaError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental changes.
pub fn run_migrations(conn: &Connection) -> Result<(), QaError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| QaError::Storage(format!("failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| QaError::Storage(format!("failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: initial schema (policies + chunks).
fn apply_v1(conn: &Connection) -> Result<(), QaError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS policies (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            name                 TEXT NOT NULL,
            region               TEXT,
            category             TEXT,
            overview             TEXT NOT NULL DEFAULT '',
            apply_target         TEXT NOT NULL DEFAULT '',
            support_description  TEXT NOT NULL DEFAULT '',
            url                  TEXT,
            extras               TEXT NOT NULL DEFAULT '{}',
            created_at           INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_policies_region
            ON policies (region);

        CREATE INDEX IF NOT EXISTS idx_policies_category
            ON policies (category);

        CREATE TABLE IF NOT EXISTS chunks (
            chunk_id     INTEGER PRIMARY KEY AUTOINCREMENT,
            policy_id    INTEGER NOT NULL,
            chunk_index  INTEGER NOT NULL,
            content      TEXT NOT NULL,
            doc_type     TEXT NOT NULL DEFAULT 'support',
            created_at   INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            FOREIGN KEY (policy_id) REFERENCES policies(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_policy
            ON chunks (policy_id, chunk_index ASC);

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| QaError::Storage(format!("failed to apply migration v1: {}", e)))?;

    Ok(())
}
