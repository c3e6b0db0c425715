use anyhow::{anyhow, Result};
use arrow_array::{FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray, UInt32Array};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType, Table};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use review_core::traits::{ChunkIndex, Embedder};
use review_core::types::{Chunk, SearchHit};

use crate::embed_texts;
use crate::schema::{build_arrow_schema, sql_literal, CHUNKS_TABLE};

/// Dense index on LanceDB. All collections share one table and are told apart
/// by the `collection` column; search is an exact cosine scan filtered to
/// one collection.
pub struct LanceChunkIndex { db: Connection, embedder: Arc<dyn Embedder>, table: Mutex<Option<Table>> }

impl LanceChunkIndex {
	pub async fn open(db_path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
		std::fs::create_dir_all(db_path)?;
		let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
		let table = if db.table_names().execute().await?.iter().any(|n| n == CHUNKS_TABLE) {
			Some(db.open_table(CHUNKS_TABLE).execute().await?)
		} else { None };
		tracing::info!(path = %db_path.display(), existing = table.is_some(), "opened LanceDB");
		Ok(Self { db, embedder, table: Mutex::new(table) })
	}

	async fn table(&self) -> Option<Table> { self.table.lock().await.clone() }

	fn to_record_batch(&self, collection: &str, chunks: &[Chunk], vectors: Vec<Vec<f32>>) -> Result<RecordBatch> {
		let dim = self.embedder.dim() as i32;
		let collections = vec![collection.to_string(); chunks.len()];
		let sequence_ids: Vec<String> = chunks.iter().map(|c| c.sequence_id.clone()).collect();
		let pages: Vec<u32> = chunks.iter().map(|c| c.page_number).collect();
		let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
		let vectors = vectors.into_iter().map(|v| Some(v.into_iter().map(Some).collect::<Vec<_>>()));
		Ok(RecordBatch::try_new(build_arrow_schema(dim), vec![
			Arc::new(StringArray::from(collections)),
			Arc::new(StringArray::from(sequence_ids)),
			Arc::new(UInt32Array::from(pages)),
			Arc::new(StringArray::from(texts)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, dim)),
		])?)
	}
}

#[async_trait]
impl ChunkIndex for LanceChunkIndex {
	async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
		if chunks.is_empty() { return Ok(()); }
		let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
		let vectors = embed_texts(self.embedder.clone(), texts).await?;
		let record_batch = self.to_record_batch(collection, chunks, vectors)?;
		let schema = record_batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		let mut guard = self.table.lock().await;
		match guard.as_ref() {
			Some(table) => { table.add(reader).execute().await?; }
			None => { *guard = Some(self.db.create_table(CHUNKS_TABLE, reader).execute().await?); }
		}
		tracing::debug!(collection, chunks = chunks.len(), "lance insert committed");
		Ok(())
	}

	async fn search(&self, collection: &str, query: &str, k: usize) -> Result<Vec<SearchHit>> {
		let Some(table) = self.table().await else { return Ok(Vec::new()) };
		let q_vec = embed_texts(self.embedder.clone(), vec![query.to_string()]).await?.pop().ok_or_else(|| anyhow!("embedder returned no vector"))?;
		let mut stream = table.query().nearest_to(q_vec)?
			.distance_type(DistanceType::Cosine)
			.only_if(format!("collection = {}", sql_literal(collection)))
			.limit(k)
			.execute().await?;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			let ids = batch.column_by_name("sequence_id").and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("sequence_id column missing"))?;
			let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());
			for i in 0..batch.num_rows() {
				let score = distances.map(|d| 1.0 - d.value(i)).unwrap_or(0.0);
				hits.push(SearchHit { sequence_id: ids.value(i).to_string(), score });
			}
		}
		hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(k);
		Ok(hits)
	}

	async fn delete(&self, collection: &str) -> Result<()> {
		if let Some(table) = self.table().await {
			table.delete(&format!("collection = {}", sql_literal(collection))).await?;
		}
		Ok(())
	}
}
