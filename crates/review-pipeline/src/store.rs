//! Chunk stores with all-or-nothing replacement.
//!
//! Every replacement writes a fresh index collection `<corpus>-g<generation>`
//! while the previous generation stays queryable, then swaps the store's
//! active snapshot under the write lock and drops the old collection. Queries
//! hold the read lock across the index round trip, so they see either the
//! whole old document or the whole new one.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use review_core::error::{Error, Result};
use review_core::traits::{ChunkIndex, DocumentSplitter};
use review_core::types::{Chunk, CorpusId, PageChunk, RetrievedChunk};

/// The live contents of one corpus.
#[derive(Debug)]
pub struct CorpusSnapshot {
    pub generation: u64,
    pub collection: String,
    pub chunks: Vec<Chunk>,
}

pub struct ChunkStore {
    corpus: CorpusId,
    index: Arc<dyn ChunkIndex>,
    active: RwLock<Option<Arc<CorpusSnapshot>>>,
    // Serializes replacements; queries only contend on `active`.
    writer: Mutex<()>,
    generations: AtomicU64,
}

impl ChunkStore {
    pub fn new(corpus: CorpusId, index: Arc<dyn ChunkIndex>) -> Self {
        Self { corpus, index, active: RwLock::new(None), writer: Mutex::new(()), generations: AtomicU64::new(0) }
    }

    pub fn corpus(&self) -> CorpusId { self.corpus }

    /// Replace the corpus with `chunks` and return how many were stored.
    pub async fn replace(&self, chunks: Vec<PageChunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Err(Error::invalid_field("file", "document produced no text chunks"));
        }
        let _writer = self.writer.lock().await;
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let collection = format!("{}-g{}", self.corpus, generation);
        let chunks: Vec<Chunk> = chunks
            .into_iter()
            .enumerate()
            .map(|(i, c)| Chunk { corpus: self.corpus, sequence_id: i.to_string(), page_number: c.page_number, text: c.text })
            .collect();

        // A previous process may have left a collection under the same name.
        let written = match self.index.delete(&collection).await {
            Ok(()) => self.index.insert(&collection, &chunks).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = self.index.delete(&collection).await {
                tracing::warn!(corpus = %self.corpus, collection, error = %cleanup, "failed to remove partial collection");
            }
            tracing::error!(corpus = %self.corpus, collection, error = %e, "index rejected replacement");
            return Err(Error::CorpusWrite { corpus: self.corpus, message: format!("{e:#}") });
        }

        let count = chunks.len();
        let snapshot = Arc::new(CorpusSnapshot { generation, collection, chunks });
        let mut active = self.active.write().await;
        if let Some(old) = active.replace(snapshot) {
            if let Err(e) = self.index.delete(&old.collection).await {
                tracing::warn!(corpus = %self.corpus, collection = %old.collection, error = %e, "failed to remove replaced collection");
            }
        }
        drop(active);
        tracing::info!(corpus = %self.corpus, generation, chunks = count, "corpus replaced");
        Ok(count)
    }

    /// Top-`k` chunks most similar to `query_text`, best first.
    pub async fn query(&self, query_text: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(Error::invalid_field("k", "at least one result must be requested"));
        }
        let active = self.active.read().await;
        let snapshot = active.as_ref().ok_or(Error::EmptyCorpus(self.corpus))?;
        let hits = self
            .index
            .search(&snapshot.collection, query_text, k)
            .await
            .map_err(|e| Error::Index(format!("{e:#}")))?;
        let mut out = Vec::with_capacity(hits.len());
        for hit in hits.into_iter().take(k) {
            let chunk = hit.sequence_id.parse::<usize>().ok().and_then(|i| snapshot.chunks.get(i));
            match chunk {
                Some(c) => out.push(RetrievedChunk { sequence_id: c.sequence_id.clone(), page_number: c.page_number, text: c.text.clone(), score: hit.score }),
                None => tracing::warn!(corpus = %self.corpus, sequence_id = %hit.sequence_id, "index returned an unknown chunk"),
            }
        }
        Ok(out)
    }

    /// All chunks in insertion order.
    pub async fn get_all(&self) -> Result<Vec<Chunk>> {
        Ok(self.snapshot().await.ok_or(Error::EmptyCorpus(self.corpus))?.chunks.clone())
    }

    pub async fn snapshot(&self) -> Option<Arc<CorpusSnapshot>> { self.active.read().await.clone() }

    pub async fn len(&self) -> usize { self.snapshot().await.map(|s| s.chunks.len()).unwrap_or(0) }

    pub async fn is_empty(&self) -> bool { self.len().await == 0 }
}

/// The reviewer and reviewee stores. Each has its own locks.
pub struct CorpusManager {
    reviewer: ChunkStore,
    reviewee: ChunkStore,
}

impl CorpusManager {
    pub fn new(index: Arc<dyn ChunkIndex>) -> Self {
        Self {
            reviewer: ChunkStore::new(CorpusId::Reviewer, index.clone()),
            reviewee: ChunkStore::new(CorpusId::Reviewee, index),
        }
    }

    pub fn store(&self, corpus: CorpusId) -> &ChunkStore {
        match corpus {
            CorpusId::Reviewer => &self.reviewer,
            CorpusId::Reviewee => &self.reviewee,
        }
    }

    pub async fn replace(&self, corpus: CorpusId, chunks: Vec<PageChunk>) -> Result<usize> { self.store(corpus).replace(chunks).await }

    pub async fn query(&self, corpus: CorpusId, query_text: &str, k: usize) -> Result<Vec<RetrievedChunk>> { self.store(corpus).query(query_text, k).await }

    pub async fn get_all(&self, corpus: CorpusId) -> Result<Vec<Chunk>> { self.store(corpus).get_all().await }

    pub async fn len(&self, corpus: CorpusId) -> usize { self.store(corpus).len().await }

    /// Split the document at `path` and make it the corpus's only document.
    pub async fn ingest(&self, corpus: CorpusId, splitter: Arc<dyn DocumentSplitter>, path: PathBuf) -> Result<usize> {
        let pages = tokio::task::spawn_blocking(move || splitter.split(&path))
            .await
            .map_err(|e| Error::Index(format!("splitter task failed: {e}")))?
            .map_err(|e| Error::invalid_field("file", format!("{e:#}")))?;
        self.replace(corpus, pages).await
    }
}
