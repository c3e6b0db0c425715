use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::{doc, Index, TantivyDocument};

use review_core::traits::ChunkIndex;
use review_core::types::{Chunk, SearchHit};

use crate::tantivy_utils::{build_schema, register_tokenizer, SEQUENCE_ID, TEXT};

const WRITER_MEMORY_BYTES: usize = 50_000_000;

#[derive(Clone)]
struct Collection {
	index: Index,
	sequence_id_field: Field,
	text_field: Field,
}

impl Collection {
	fn create(dir: Option<PathBuf>) -> Result<Self> {
		let schema = build_schema();
		let index = match dir {
			Some(dir) => {
				if dir.exists() { std::fs::remove_dir_all(&dir)?; }
				std::fs::create_dir_all(&dir)?;
				Index::create_in_dir(&dir, schema.clone())?
			}
			None => Index::create_in_ram(schema.clone()),
		};
		register_tokenizer(&index);
		let sequence_id_field = schema.get_field(SEQUENCE_ID)?;
		let text_field = schema.get_field(TEXT)?;
		Ok(Self { index, sequence_id_field, text_field })
	}

	fn write(&self, chunks: &[Chunk]) -> Result<()> {
		let mut index_writer = self.index.writer_with_num_threads::<TantivyDocument>(1, WRITER_MEMORY_BYTES)?;
		for c in chunks {
			index_writer.add_document(doc!(
				self.sequence_id_field => c.sequence_id.clone(),
				self.text_field => c.text.clone(),
			))?;
		}
		index_writer.commit()?;
		Ok(())
	}

	fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
		let reader = self.index.reader()?;
		let searcher = reader.searcher();
		let qp = QueryParser::for_index(&self.index, vec![self.text_field]);
		// Questions carry syntax characters such as '(' and ':'; keep what parses.
		let (q, errors) = qp.parse_query_lenient(query);
		if !errors.is_empty() { tracing::debug!(errors = errors.len(), "lenient query parse dropped clauses"); }
		let top_docs = searcher.search(&q, &TopDocs::with_limit(k))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let sequence_id = doc.get_first(self.sequence_id_field).and_then(|v| v.as_str()).unwrap_or_default().to_string();
			hits.push(SearchHit { sequence_id, score });
		}
		Ok(hits)
	}
}

/// BM25 text index with one Tantivy index per collection, held in RAM or
/// under `root/<collection>` on disk.
pub struct TantivyChunkIndex {
	root: Option<PathBuf>,
	collections: RwLock<HashMap<String, Collection>>,
}

impl TantivyChunkIndex {
	pub fn in_ram() -> Self { Self { root: None, collections: RwLock::new(HashMap::new()) } }

	pub fn in_dir(root: PathBuf) -> Result<Self> {
		std::fs::create_dir_all(&root)?;
		Ok(Self { root: Some(root), collections: RwLock::new(HashMap::new()) })
	}

	fn collection(&self, name: &str) -> Option<Collection> { self.collections.read().get(name).cloned() }
}

#[async_trait]
impl ChunkIndex for TantivyChunkIndex {
	async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
		let existing = self.collection(collection);
		let dir = self.root.as_ref().map(|r| r.join(collection));
		let owned = chunks.to_vec();
		let col = tokio::task::spawn_blocking(move || -> Result<Collection> {
			let col = match existing { Some(col) => col, None => Collection::create(dir)? };
			col.write(&owned)?;
			Ok(col)
		})
		.await??;
		self.collections.write().insert(collection.to_string(), col);
		tracing::debug!(collection, chunks = chunks.len(), "tantivy insert committed");
		Ok(())
	}

	async fn search(&self, collection: &str, query: &str, k: usize) -> Result<Vec<SearchHit>> {
		let Some(col) = self.collection(collection) else { return Ok(Vec::new()) };
		let query = query.to_string();
		tokio::task::spawn_blocking(move || col.search(&query, k)).await?
	}

	async fn delete(&self, collection: &str) -> Result<()> {
		let removed = self.collections.write().remove(collection);
		if removed.is_some() {
			if let Some(dir) = self.root.as_ref().map(|r| r.join(collection)) {
				if dir.exists() { std::fs::remove_dir_all(&dir)?; }
			}
		}
		Ok(())
	}
}
