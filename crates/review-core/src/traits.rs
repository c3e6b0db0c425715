use std::path::Path;

use async_trait::async_trait;

use crate::types::{Chunk, GenerationRequest, PageChunk, SearchHit};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Similarity index over chunk text, partitioned into named collections.
///
/// A collection is written once by `insert` and removed as a whole by
/// `delete`; the chunk store never mixes chunks of two documents in one
/// collection.
#[async_trait]
pub trait ChunkIndex: Send + Sync {
    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> anyhow::Result<()>;
    /// Best `k` hits, best first. An unknown collection yields no hits.
    async fn search(&self, collection: &str, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>>;
    /// Removing an unknown collection is not an error.
    async fn delete(&self, collection: &str) -> anyhow::Result<()>;
}

/// Free-text generation backend. Implementations must bound every call with
/// a timeout and report it as `Error::GenerationTimeout`.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> crate::error::Result<String>;
}

pub trait DocumentSplitter: Send + Sync {
    fn split(&self, path: &Path) -> anyhow::Result<Vec<PageChunk>>;
}
