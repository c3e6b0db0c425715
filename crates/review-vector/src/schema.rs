use arrow_schema::{Schema, Field, DataType};
use std::sync::Arc;

pub const CHUNKS_TABLE: &str = "chunks";

/// One row per chunk; `collection` partitions rows the way separate indexes would.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("collection", DataType::Utf8, false),
		Field::new("sequence_id", DataType::Utf8, false),
		Field::new("page_number", DataType::UInt32, false),
		Field::new("text", DataType::Utf8, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}

/// SQL string literal for a `only_if` / `delete` predicate.
pub fn sql_literal(value: &str) -> String { format!("'{}'", value.replace('\'', "''")) }
