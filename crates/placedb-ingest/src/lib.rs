pub mod describe;
pub mod pipeline;

pub use describe::{formatter_for, DescriptionFormatter};
pub use pipeline::{build_record, IngestBatch, IngestPipeline, IngestSummary, OVERLENGTH_SET};
