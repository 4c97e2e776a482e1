pub mod client;
pub mod partition;
pub mod retry;
pub mod wire;

pub use client::HttpPlaceSearch;
pub use partition::{Leaf, PartitionEngine, PartitionOptions, PartitionReport};
pub use retry::{RetryPolicy, Retrying};
