use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use review_core::traits::{ChunkIndex, Embedder};
use review_core::types::{Chunk, SearchHit, SequenceId};

use crate::embed_texts;

/// Brute-force cosine index kept in process memory. Nothing survives a
/// restart, which suits tests and single-session use.
pub struct MemoryChunkIndex {
	embedder: Arc<dyn Embedder>,
	collections: RwLock<HashMap<String, Vec<(SequenceId, Vec<f32>)>>>,
}

impl MemoryChunkIndex {
	pub fn new(embedder: Arc<dyn Embedder>) -> Self { Self { embedder, collections: RwLock::new(HashMap::new()) } }
}

#[async_trait]
impl ChunkIndex for MemoryChunkIndex {
	async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
		let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
		let vectors = embed_texts(self.embedder.clone(), texts).await?;
		let rows = chunks.iter().map(|c| c.sequence_id.clone()).zip(vectors);
		self.collections.write().entry(collection.to_string()).or_default().extend(rows);
		Ok(())
	}

	async fn search(&self, collection: &str, query: &str, k: usize) -> Result<Vec<SearchHit>> {
		if !self.collections.read().contains_key(collection) { return Ok(Vec::new()); }
		let q_vec = embed_texts(self.embedder.clone(), vec![query.to_string()]).await?.remove(0);
		let guard = self.collections.read();
		let Some(rows) = guard.get(collection) else { return Ok(Vec::new()) };
		let mut hits: Vec<SearchHit> = rows.iter().map(|(id, v)| SearchHit { sequence_id: id.clone(), score: cosine_similarity(&q_vec, v) }).collect();
		hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(k);
		Ok(hits)
	}

	async fn delete(&self, collection: &str) -> Result<()> {
		self.collections.write().remove(collection);
		Ok(())
	}
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	if a.len() != b.len() { return 0.0; }
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
	if norm_a == 0.0 || norm_b == 0.0 { 0.0 } else { dot / (norm_a * norm_b) }
}
