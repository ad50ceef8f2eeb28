//! Persistence for aggregated analyses.
//!
//! One record per repository id. Every write replaces the whole record, so a refresh
//! never leaves items from a previous run behind.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::Result;
use crate::analysis::AggregateAnalysis;

const LOG_TARGET: &str = "     store";

/// Keyed storage of [`AggregateAnalysis`] records.
pub trait AnalysisStore: Send + Sync {
    /// The record for `repository_id`, or `None` if nothing has been stored yet.
    fn get(&self, repository_id: u64) -> Result<Option<AggregateAnalysis>>;

    /// Store `analysis` under its repository id, replacing any previous record.
    fn put(&self, analysis: &AggregateAnalysis) -> Result<()>;
}
