//! SQLite-backed directive store.
//!
//! In-process vector index using SQLite for passage rows and brute-force
//! cosine similarity for search. The directive is a few hundred chunks at
//! most, so a linear scan is well within budget.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{DirectiveStore, IngestMeta, PassageMatch, StoredPassage};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub struct SqliteDirectiveStore {
    pool: SqlitePool,
}

impl SqliteDirectiveStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS directive_passages (
                passage_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                chunk_index INTEGER NOT NULL DEFAULT 0,
                start_offset INTEGER NOT NULL DEFAULT 0,
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS directive_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_passage(row: &sqlx::sqlite::SqliteRow) -> StoredPassage {
        let chunk_index: i64 = row.get("chunk_index");
        let start_offset: i64 = row.get("start_offset");
        StoredPassage {
            passage_id: row.get("passage_id"),
            content: row.get("content"),
            source: row.get("source"),
            chunk_index: chunk_index.max(0) as usize,
            start_offset: start_offset.max(0) as usize,
        }
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>, ApiError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM directive_meta WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(ApiError::internal)?;
        Ok(value)
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT OR REPLACE INTO directive_meta (key, value, updated_at)
             VALUES (?1, ?2, STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;
        Ok(())
    }
}

#[async_trait]
impl DirectiveStore for SqliteDirectiveStore {
    async fn insert_batch(&self, items: Vec<(StoredPassage, Vec<f32>)>) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (passage, embedding) in &items {
            let blob = Self::serialize_embedding(embedding);

            sqlx::query(
                "INSERT OR REPLACE INTO directive_passages
                 (passage_id, content, source, chunk_index, start_offset, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&passage.passage_id)
            .bind(&passage.content)
            .bind(&passage.source)
            .bind(passage.chunk_index as i64)
            .bind(passage.start_offset as i64)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<PassageMatch>, ApiError> {
        let rows = sqlx::query(
            "SELECT passage_id, content, source, chunk_index, start_offset, embedding
             FROM directive_passages",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut scored: Vec<PassageMatch> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored_emb = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(query_embedding, &stored_emb);

                Some(PassageMatch {
                    passage: Self::row_to_passage(row),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit.max(1));

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM directive_passages")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(count as usize)
    }

    async fn clear(&self) -> Result<usize, ApiError> {
        let result = sqlx::query("DELETE FROM directive_passages")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(result.rows_affected() as usize)
    }

    async fn ingest_meta(&self) -> Result<Option<IngestMeta>, ApiError> {
        let fingerprint = self.get_meta("pdf_fingerprint").await?;
        let embedding_model = self.get_meta("embedding_model").await?;

        Ok(match (fingerprint, embedding_model) {
            (Some(fingerprint), Some(embedding_model)) => Some(IngestMeta {
                fingerprint,
                embedding_model,
            }),
            _ => None,
        })
    }

    async fn record_ingest(&self, meta: &IngestMeta) -> Result<(), ApiError> {
        self.set_meta("pdf_fingerprint", &meta.fingerprint).await?;
        self.set_meta("embedding_model", &meta.embedding_model)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteDirectiveStore {
        let tmp = std::env::temp_dir().join(format!(
            "vigie-directive-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        SqliteDirectiveStore::with_path(tmp).await.unwrap()
    }

    fn make_passage(id: &str, content: &str, source: &str, index: usize) -> StoredPassage {
        StoredPassage {
            passage_id: id.to_string(),
            content: content.to_string(),
            source: source.to_string(),
            chunk_index: index,
            start_offset: index * 100,
        }
    }

    #[tokio::test]
    async fn insert_and_search_ranks_by_similarity() {
        let store = test_store().await;

        store
            .insert_batch(vec![
                (make_passage("p1", "bruit machines", "doc p.1", 0), vec![1.0, 0.0, 0.0]),
                (make_passage("p2", "chute hauteur", "doc p.2", 1), vec![0.0, 1.0, 0.0]),
                (make_passage("p3", "produits chimiques", "doc p.3", 2), vec![0.7, 0.7, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 3);

        let results = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].passage.passage_id, "p1");
        assert!(results[0].score > 0.99);
        assert_eq!(results[1].passage.passage_id, "p3");
    }

    #[tokio::test]
    async fn mismatched_vector_lengths_score_zero() {
        let store = test_store().await;

        store
            .insert_batch(vec![(
                make_passage("p1", "texte", "doc p.1", 0),
                vec![1.0, 0.0],
            )])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 0.0);
    }

    #[tokio::test]
    async fn clear_removes_passages_but_count_reflects_it() {
        let store = test_store().await;

        store
            .insert_batch(vec![(
                make_passage("p1", "texte", "doc p.1", 0),
                vec![1.0],
            )])
            .await
            .unwrap();

        let deleted = store.clear().await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ingest_meta_round_trip() {
        let store = test_store().await;
        assert!(store.ingest_meta().await.unwrap().is_none());

        let meta = IngestMeta {
            fingerprint: "abc123".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
        };
        store.record_ingest(&meta).await.unwrap();

        assert_eq!(store.ingest_meta().await.unwrap(), Some(meta));
    }
}
