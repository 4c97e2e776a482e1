use anyhow::{Result, anyhow};
use arrow_array::{Array, Float32Array, Float64Array, Int32Array, RecordBatch, StringArray};

fn col<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| anyhow!("missing or mistyped column '{}'", name))
}

pub fn strings<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> { col(batch, name) }
pub fn f64s<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> { col(batch, name) }
pub fn i32s<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> { col(batch, name) }
pub fn f32s<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float32Array> { col(batch, name) }
