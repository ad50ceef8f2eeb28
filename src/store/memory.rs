use super::AnalysisStore;
use crate::Result;
use crate::analysis::AggregateAnalysis;
use std::collections::HashMap;
use std::sync::RwLock;

/// A process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<u64, AggregateAnalysis>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().expect("lock not poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnalysisStore for MemoryStore {
    fn get(&self, repository_id: u64) -> Result<Option<AggregateAnalysis>> {
        Ok(self.records.read().expect("lock not poisoned").get(&repository_id).cloned())
    }

    fn put(&self, analysis: &AggregateAnalysis) -> Result<()> {
        let _ = self
            .records
            .write()
            .expect("lock not poisoned")
            .insert(analysis.repository.id, analysis.clone());
        Ok(())
    }
}
