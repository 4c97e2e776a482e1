pub mod filter;
pub mod funnel;
pub mod rerank;

pub use filter::{AdaptiveFilter, FilterOutcome, ThresholdPolicy};
pub use funnel::{FunnelStage, Retrieval, RetrievalFunnel};
pub use rerank::SimilarityReranker;
