//! Directive index orchestration: load → chunk → embed → store, then
//! top-k retrieval with citation-formatted context.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::chunker::{split_into_chunks, ChunkerConfig, TextChunk};
use super::loader::{load_directive, DirectiveSection};
use super::store::{DirectiveStore, IngestMeta, PassageMatch, StoredPassage};
use crate::core::config::ConfigService;
use crate::core::errors::ApiError;
use crate::llm::LlmService;

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub passages: usize,
    /// True when the existing index matched the PDF fingerprint and the
    /// embedding model, and no work was done.
    pub reused: bool,
    pub fingerprint: String,
}

#[derive(Debug, Clone)]
struct DirectiveSettings {
    pdf_path: PathBuf,
    chunker: ChunkerConfig,
    top_k: usize,
    max_context_chars: usize,
    similarity_threshold: f32,
    embed_batch_size: usize,
}

#[derive(Clone)]
pub struct DirectiveIndex {
    store: Arc<dyn DirectiveStore>,
    llm: LlmService,
    config: ConfigService,
}

impl DirectiveIndex {
    pub fn new(store: Arc<dyn DirectiveStore>, llm: LlmService, config: ConfigService) -> Self {
        Self { store, llm, config }
    }

    pub async fn passage_count(&self) -> Result<usize, ApiError> {
        self.store.count().await
    }

    pub async fn ingest_meta(&self) -> Result<Option<IngestMeta>, ApiError> {
        self.store.ingest_meta().await
    }

    /// Ingest the configured directive PDF unless the index already holds
    /// it (same file fingerprint, same embedding model).
    pub async fn ensure_ingested(&self) -> Result<IngestOutcome, ApiError> {
        self.ingest_pdf(false).await
    }

    /// Rebuild the index regardless of the stored fingerprint.
    pub async fn reindex(&self) -> Result<IngestOutcome, ApiError> {
        self.ingest_pdf(true).await
    }

    async fn ingest_pdf(&self, force: bool) -> Result<IngestOutcome, ApiError> {
        let settings = self.settings()?;

        let bytes = std::fs::read(&settings.pdf_path).map_err(|err| {
            ApiError::NotFound(format!(
                "cannot read directive PDF {}: {}",
                settings.pdf_path.display(),
                err
            ))
        })?;
        let fingerprint = hex::encode(Sha256::digest(&bytes));

        if !force && self.index_is_current(&fingerprint).await? {
            let passages = self.store.count().await?;
            tracing::debug!("Directive index is current ({} passages)", passages);
            return Ok(IngestOutcome {
                passages,
                reused: true,
                fingerprint,
            });
        }

        let sections = load_directive(&settings.pdf_path)?;
        let label = settings
            .pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "directive".to_string());

        self.ingest_sections(&label, &sections, &fingerprint).await
    }

    /// Chunk, embed and store the given sections under `fingerprint`.
    pub async fn ingest_sections(
        &self,
        label: &str,
        sections: &[DirectiveSection],
        fingerprint: &str,
    ) -> Result<IngestOutcome, ApiError> {
        let settings = self.settings()?;

        let mut chunks: Vec<TextChunk> = Vec::new();
        for section in sections {
            let source = if sections.len() > 1 {
                format!("{} p.{}", label, section.page)
            } else {
                label.to_string()
            };
            chunks.extend(split_into_chunks(&section.text, &source, &settings.chunker));
        }

        if chunks.is_empty() {
            return Err(ApiError::Internal(format!(
                "directive {} produced no chunks",
                label
            )));
        }

        tracing::info!("Indexing directive {}: {} chunks", label, chunks.len());
        self.store.clear().await?;

        let mut stored = 0usize;
        for batch in chunks.chunks(settings.embed_batch_size.max(1)) {
            let inputs: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.llm.embed(&inputs).await?;
            if embeddings.len() != batch.len() {
                return Err(ApiError::Internal(format!(
                    "embedding batch returned {} vectors for {} chunks",
                    embeddings.len(),
                    batch.len()
                )));
            }

            let items: Vec<(StoredPassage, Vec<f32>)> = batch
                .iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| {
                    (
                        StoredPassage {
                            passage_id: uuid::Uuid::new_v4().to_string(),
                            content: chunk.text.clone(),
                            source: chunk.source.clone(),
                            chunk_index: chunk.chunk_index,
                            start_offset: chunk.start_offset,
                        },
                        embedding,
                    )
                })
                .collect();

            stored += items.len();
            self.store.insert_batch(items).await?;
        }

        self.store
            .record_ingest(&IngestMeta {
                fingerprint: fingerprint.to_string(),
                embedding_model: self.llm.embedding_model(),
            })
            .await?;

        Ok(IngestOutcome {
            passages: stored,
            reused: false,
            fingerprint: fingerprint.to_string(),
        })
    }

    /// Top-k passages for a compliance query, filtered by the similarity
    /// threshold.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<PassageMatch>, ApiError> {
        let settings = self.settings()?;

        if self.store.count().await? == 0 {
            return Err(ApiError::ServiceUnavailable(
                "directive index is empty; ingest the directive PDF first".to_string(),
            ));
        }

        let query_embedding = self
            .llm
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ApiError::Internal("embedding the query returned no vector".to_string())
            })?;

        let mut matches = self.store.search(&query_embedding, settings.top_k).await?;
        matches.retain(|m| m.score >= settings.similarity_threshold);
        Ok(matches)
    }

    /// Format retrieved passages into a numbered, cited context block,
    /// capped at `max_context_chars`.
    pub fn build_context(&self, matches: &[PassageMatch]) -> Result<String, ApiError> {
        let settings = self.settings()?;

        let mut context = String::new();
        let mut current_length = 0usize;

        for (i, m) in matches.iter().enumerate() {
            let entry = format!(
                "[{}] ({}, pertinence {:.2})\n{}\n\n",
                i + 1,
                m.passage.source,
                m.score,
                m.passage.content
            );
            if current_length + entry.chars().count() > settings.max_context_chars {
                break;
            }
            current_length += entry.chars().count();
            context.push_str(&entry);
        }

        Ok(context.trim().to_string())
    }

    async fn index_is_current(&self, fingerprint: &str) -> Result<bool, ApiError> {
        if self.store.count().await? == 0 {
            return Ok(false);
        }
        let Some(meta) = self.store.ingest_meta().await? else {
            return Ok(false);
        };
        Ok(meta.fingerprint == fingerprint && meta.embedding_model == self.llm.embedding_model())
    }

    fn settings(&self) -> Result<DirectiveSettings, ApiError> {
        let config = self.config.load_config()?;
        let section = config.get("directive").cloned().unwrap_or(Value::Null);

        let pdf_path_raw = section
            .get("pdf_path")
            .and_then(|v| v.as_str())
            .unwrap_or("directive-cfst.pdf");
        let pdf_path = {
            let candidate = PathBuf::from(pdf_path_raw);
            if candidate.is_absolute() {
                candidate
            } else {
                self.config.paths().project_root.join(candidate)
            }
        };

        Ok(DirectiveSettings {
            pdf_path,
            chunker: ChunkerConfig {
                chunk_size: section
                    .get("chunk_size")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(1000) as usize,
                chunk_overlap: section
                    .get("chunk_overlap")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(100) as usize,
            },
            top_k: section.get("top_k").and_then(|v| v.as_u64()).unwrap_or(4) as usize,
            max_context_chars: section
                .get("max_context_chars")
                .and_then(|v| v.as_u64())
                .unwrap_or(6000) as usize,
            similarity_threshold: section
                .get("similarity_threshold")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.1) as f32,
            embed_batch_size: section
                .get("embed_batch_size")
                .and_then(|v| v.as_u64())
                .unwrap_or(32) as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::config::AppPaths;
    use crate::directive::sqlite::SqliteDirectiveStore;
    use crate::llm::testing::ScriptedProvider;

    async fn test_index(tmp: &std::path::Path) -> DirectiveIndex {
        let paths = Arc::new(AppPaths::for_test(tmp));
        let config = ConfigService::new(paths.clone());
        let store = SqliteDirectiveStore::new(&paths).await.unwrap();
        let llm = LlmService::new(
            Arc::new(ScriptedProvider::with_replies(vec![])),
            config.clone(),
        );
        DirectiveIndex::new(Arc::new(store), llm, config)
    }

    fn section(page: usize, text: &str) -> DirectiveSection {
        DirectiveSection {
            page,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn ingest_then_retrieve_finds_related_passage() {
        let tmp = tempfile::tempdir().unwrap();
        let index = test_index(tmp.path()).await;

        let sections = vec![
            section(1, "Les dangers particuliers exigent des specialistes MSST."),
            section(2, "Le port du casque est obligatoire sur les chantiers."),
        ];

        let outcome = index
            .ingest_sections("directive-cfst.pdf", &sections, "fp-1")
            .await
            .unwrap();
        assert!(!outcome.reused);
        assert_eq!(outcome.passages, 2);
        assert_eq!(index.passage_count().await.unwrap(), 2);

        let matches = index
            .retrieve("Les dangers particuliers exigent des specialistes MSST.")
            .await
            .unwrap();
        assert!(!matches.is_empty());
        assert!(matches[0].passage.content.contains("specialistes MSST"));
        assert_eq!(matches[0].passage.source, "directive-cfst.pdf p.1");
    }

    #[tokio::test]
    async fn retrieve_on_empty_index_is_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let index = test_index(tmp.path()).await;

        let err = index.retrieve("bruit").await.unwrap_err();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn reingest_replaces_previous_passages() {
        let tmp = tempfile::tempdir().unwrap();
        let index = test_index(tmp.path()).await;

        index
            .ingest_sections("doc", &[section(1, "Ancien contenu de la directive.")], "fp-1")
            .await
            .unwrap();
        index
            .ingest_sections("doc", &[section(1, "Nouveau contenu de la directive.")], "fp-2")
            .await
            .unwrap();

        assert_eq!(index.passage_count().await.unwrap(), 1);
        let meta = index.ingest_meta().await.unwrap().unwrap();
        assert_eq!(meta.fingerprint, "fp-2");
    }

    #[tokio::test]
    async fn context_is_numbered_and_cites_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let index = test_index(tmp.path()).await;

        let matches = vec![
            PassageMatch {
                passage: StoredPassage {
                    passage_id: "p1".to_string(),
                    content: "Annexe 1: dangers particuliers.".to_string(),
                    source: "directive-cfst.pdf p.4".to_string(),
                    chunk_index: 0,
                    start_offset: 0,
                },
                score: 0.91,
            },
            PassageMatch {
                passage: StoredPassage {
                    passage_id: "p2".to_string(),
                    content: "Obligation de recourir aux specialistes.".to_string(),
                    source: "directive-cfst.pdf p.7".to_string(),
                    chunk_index: 1,
                    start_offset: 500,
                },
                score: 0.72,
            },
        ];

        let context = index.build_context(&matches).unwrap();
        assert!(context.starts_with("[1] (directive-cfst.pdf p.4, pertinence 0.91)"));
        assert!(context.contains("[2] (directive-cfst.pdf p.7"));
        assert!(context.contains("Annexe 1"));
    }
}
