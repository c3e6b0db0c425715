use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use review_core::config::{IndexBackend, IndexSettings};
use review_core::traits::{ChunkIndex, Embedder};
use review_core::types::{Chunk, SearchHit};
use review_text::TantivyChunkIndex;
use review_vector::{LanceChunkIndex, MemoryChunkIndex};

/// Rank constant for reciprocal rank fusion.
pub const RRF_K: usize = 60;

pub struct HybridChunkIndex<T, V> where T: ChunkIndex, V: ChunkIndex {
    text: T,
    vector: V,
}

impl<T, V> HybridChunkIndex<T, V> where T: ChunkIndex, V: ChunkIndex {
    pub fn new(text: T, vector: V) -> Self { Self { text, vector } }
}

#[async_trait]
impl<T, V> ChunkIndex for HybridChunkIndex<T, V> where T: ChunkIndex, V: ChunkIndex {
    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let written = tokio::try_join!(self.vector.insert(collection, chunks), self.text.insert(collection, chunks));
        if let Err(e) = written {
            // Neither half may outlive a failed insert.
            if let Err(cleanup) = self.delete(collection).await { tracing::warn!(collection, error = %cleanup, "cleanup after failed insert"); }
            return Err(e);
        }
        Ok(())
    }

    async fn search(&self, collection: &str, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let candidates = k.saturating_mul(2).max(k);
        let (dense_hits, text_hits) = tokio::try_join!(self.vector.search(collection, query, candidates), self.text.search(collection, query, candidates))?;
        Ok(reciprocal_rank_fusion(&dense_hits, &text_hits, RRF_K, k))
    }

    async fn delete(&self, collection: &str) -> Result<()> {
        let (v, t) = tokio::join!(self.vector.delete(collection), self.text.delete(collection));
        v.and(t)
    }
}

/// Fuse two ranked lists by `1 / (k + rank + 1)`, summed over lists. Ties
/// break on sequence id so equal inputs give equal output order.
pub fn reciprocal_rank_fusion(dense: &[SearchHit], text: &[SearchHit], k: usize, top_k: usize) -> Vec<SearchHit> {
    let mut scores: HashMap<&str, f32> = HashMap::new();
    for list in [dense, text] {
        for (rank, hit) in list.iter().enumerate() {
            *scores.entry(hit.sequence_id.as_str()).or_insert(0.0) += 1.0 / (k as f32 + rank as f32 + 1.0);
        }
    }
    let mut merged: Vec<SearchHit> = scores.into_iter().map(|(id, score)| SearchHit { sequence_id: id.to_string(), score }).collect();
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.sequence_id.cmp(&b.sequence_id)));
    merged.truncate(top_k);
    merged
}

/// Build the index selected by `index.backend`; on-disk backends live under
/// `data_dir` resolved against `base`.
pub async fn build_index(settings: &IndexSettings, base: &Path, embedder: Arc<dyn Embedder>) -> Result<Arc<dyn ChunkIndex>> {
    let data_dir = review_core::config::resolve_with_base(base, &settings.data_dir);
    tracing::info!(backend = ?settings.backend, data_dir = %data_dir.display(), "building chunk index");
    Ok(match settings.backend {
        IndexBackend::Memory => Arc::new(MemoryChunkIndex::new(embedder)),
        IndexBackend::Text => Arc::new(TantivyChunkIndex::in_dir(data_dir.join("tantivy"))?),
        IndexBackend::Vector => Arc::new(LanceChunkIndex::open(&data_dir.join("lancedb"), embedder).await?),
        IndexBackend::Hybrid => Arc::new(HybridChunkIndex::new(
            TantivyChunkIndex::in_dir(data_dir.join("tantivy"))?,
            LanceChunkIndex::open(&data_dir.join("lancedb"), embedder).await?,
        )),
    })
}
