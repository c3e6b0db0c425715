//! review-vector
//!
//! Dense `ChunkIndex` implementations: LanceDB on disk and a brute-force
//! in-memory index. Both embed chunk text with the configured `Embedder`.

use anyhow::{ensure, Result};
use std::sync::Arc;

use review_core::traits::Embedder;

pub mod lance;
pub mod memory;
pub mod schema;

pub use lance::LanceChunkIndex;
pub use memory::{cosine_similarity, MemoryChunkIndex};

/// Embed on the blocking pool; model inference must not stall the runtime.
pub(crate) async fn embed_texts(embedder: Arc<dyn Embedder>, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
	let expected = texts.len();
	let dim = embedder.dim();
	let vectors = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts)).await??;
	ensure!(vectors.len() == expected, "embedder returned {} vectors for {} texts", vectors.len(), expected);
	ensure!(vectors.iter().all(|v| v.len() == dim), "embedder returned a vector that is not {dim}-dimensional");
	Ok(vectors)
}
