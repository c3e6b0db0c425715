//! review-text
//!
//! Tantivy-backed `ChunkIndex`: BM25 ranking over chunk text with a
//! stop-word-filtering tokenizer.

pub mod index;
pub mod tantivy_utils;

pub use index::TantivyChunkIndex;
