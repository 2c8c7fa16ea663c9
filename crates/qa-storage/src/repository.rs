//! Repository implementation for SQLite-backed policy/chunk persistence.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::OptionalExtension;

use qa_core::error::QaError;
use qa_core::ports::PolicyRepository as PolicyRepositoryPort;
use qa_core::types::{DocumentChunk, PolicyId, PolicyRecord};

use crate::db::Database;

/// SQLite-backed implementation of [`PolicyRepositoryPort`].
pub struct SqlitePolicyRepository {
    db: Arc<Database>,
}

impl SqlitePolicyRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a policy and its chunks. Used by the dev-seeding CLI; not
    /// part of the `PolicyRepository` port since ingestion is out of scope.
    pub fn seed_policy(&self, policy: &PolicyRecord, chunks: &[DocumentChunk]) -> Result<(), QaError> {
        self.db.with_conn(|conn| {
            let extras = serde_json::to_string(&policy.extras)?;
            conn.execute(
                "INSERT INTO policies (id, name, region, category, overview, apply_target, support_description, url, extras)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    policy.id,
                    policy.name,
                    policy.region,
                    policy.category,
                    policy.overview,
                    policy.apply_target,
                    policy.support_description,
                    policy.url,
                    extras,
                ],
            )
            .map_err(|e| QaError::Storage(format!("failed to insert policy: {}", e)))?;

            for chunk in chunks {
                conn.execute(
                    "INSERT INTO chunks (chunk_id, policy_id, chunk_index, content, doc_type)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        chunk.chunk_id,
                        chunk.policy_id,
                        chunk.chunk_index,
                        chunk.content,
                        chunk.doc_type,
                    ],
                )
                .map_err(|e| QaError::Storage(format!("failed to insert chunk: {}", e)))?;
            }

            Ok(())
        })
    }

    /// Scroll every chunk in the corpus, without vectors. Feeds the BM25
    /// index build and the in-memory vector store's metadata.
    pub fn scroll_all_chunks(&self) -> Result<Vec<DocumentChunk>, QaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT chunk_id, policy_id, chunk_index, content, doc_type FROM chunks ORDER BY chunk_id ASC")
                .map_err(|e| QaError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(DocumentChunk {
                        chunk_id: row.get(0)?,
                        policy_id: row.get(1)?,
                        chunk_index: row.get(2)?,
                        content: row.get(3)?,
                        doc_type: row.get(4)?,
                        embedding: None,
                    })
                })
                .map_err(|e| QaError::Storage(e.to_string()))?;

            let mut chunks = Vec::new();
            for row in rows {
                chunks.push(row.map_err(|e| QaError::Storage(e.to_string()))?);
            }
            Ok(chunks)
        })
    }
}

fn row_to_policy(row: &rusqlite::Row) -> rusqlite::Result<PolicyRecord> {
    let extras_json: String = row.get(8)?;
    let extras: HashMap<String, String> = serde_json::from_str(&extras_json).unwrap_or_default();

    Ok(PolicyRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        region: row.get(2)?,
        category: row.get(3)?,
        overview: row.get(4)?,
        apply_target: row.get(5)?,
        support_description: row.get(6)?,
        url: row.get(7)?,
        extras,
    })
}

const POLICY_COLUMNS: &str =
    "id, name, region, category, overview, apply_target, support_description, url, extras";

#[async_trait]
impl PolicyRepositoryPort for SqlitePolicyRepository {
    async fn lookup_policies(
        &self,
        ids: &[PolicyId],
    ) -> Result<HashMap<PolicyId, PolicyRecord>, QaError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        self.db.with_conn(|conn| {
            let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let sql = format!(
                "SELECT {} FROM policies WHERE id IN ({})",
                POLICY_COLUMNS, placeholders
            );

            let mut stmt = conn.prepare(&sql).map_err(|e| QaError::Storage(e.to_string()))?;
            let params = rusqlite::params_from_iter(ids.iter());

            let rows = stmt
                .query_map(params, |row| row_to_policy(row))
                .map_err(|e| QaError::Storage(e.to_string()))?;

            let mut found = HashMap::new();
            for row in rows {
                // A row that fails to parse is logged and omitted rather
                // than failing the whole lookup (§7: metadata_store
                // transport recovery policy applies equally to malformed
                // rows).
                match row {
                    Ok(policy) => {
                        found.insert(policy.id, policy);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping malformed policy row");
                    }
                }
            }
            Ok(found)
        })
    }

    async fn get_policy(&self, id: PolicyId) -> Result<Option<PolicyRecord>, QaError> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT {} FROM policies WHERE id = ?1", POLICY_COLUMNS);
            let mut stmt = conn.prepare(&sql).map_err(|e| QaError::Storage(e.to_string()))?;

            stmt.query_row(rusqlite::params![id], |row| row_to_policy(row))
                .optional()
                .map_err(|e| QaError::Storage(e.to_string()))
        })
    }
}
