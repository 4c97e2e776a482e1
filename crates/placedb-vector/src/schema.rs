use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

pub const EMBEDDING_DIM: i32 = 1024;

pub fn build_places_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("external_id", DataType::Utf8, false),
		Field::new("category", DataType::Utf8, false),
		Field::new("name", DataType::Utf8, false),
		Field::new("address", DataType::Utf8, false),
		Field::new("lat", DataType::Float64, false),
		Field::new("lon", DataType::Float64, false),
		Field::new("rating", DataType::Float64, false),
		Field::new("review_count", DataType::Int32, false),
		Field::new("description", DataType::Utf8, false),
		Field::new("content_hash", DataType::Utf8, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}

pub fn build_geo_schema() -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("category", DataType::Utf8, false),
		Field::new("place_id", DataType::Utf8, false),
		Field::new("lat", DataType::Float64, false),
		Field::new("lon", DataType::Float64, false),
	]))
}

pub fn build_marker_schema() -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("set_name", DataType::Utf8, false),
		Field::new("member", DataType::Utf8, false),
		Field::new("updated_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
	]))
}
