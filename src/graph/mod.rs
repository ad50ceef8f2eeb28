//! Best-effort mirroring of analyses into a graph.
//!
//! A mirror holds one namespace per repository. Each refresh deletes the namespace and
//! writes the new projection, so the mirror reflects exactly the latest analysis. Mirror
//! failures are reported to the caller, which logs and ignores them; they never affect
//! the stored analysis.

mod document;
mod json;

pub use document::{GraphDocument, Node, NodeLabel, Relationship, RelationshipKind};
pub use json::JsonGraphSink;

use crate::Result;
use std::collections::HashMap;
use std::sync::RwLock;

const LOG_TARGET: &str = "     graph";

/// A graph store that accepts whole-namespace replacements.
pub trait GraphMirror: Send + Sync {
    /// Remove every node and relationship in `namespace`. Deleting an absent namespace succeeds.
    fn delete_namespace(&self, namespace: &str) -> impl Future<Output = Result<()>> + Send;

    /// Write `document` into its namespace.
    fn write(&self, document: &GraphDocument) -> impl Future<Output = Result<()>> + Send;

    /// The current contents of `namespace`.
    fn load(&self, namespace: &str) -> impl Future<Output = Result<Option<GraphDocument>>> + Send;
}

/// A mirror that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGraph;

impl GraphMirror for NoGraph {
    async fn delete_namespace(&self, _namespace: &str) -> Result<()> {
        Ok(())
    }

    async fn write(&self, _document: &GraphDocument) -> Result<()> {
        Ok(())
    }

    async fn load(&self, _namespace: &str) -> Result<Option<GraphDocument>> {
        Ok(None)
    }
}

/// An in-process mirror.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    namespaces: RwLock<HashMap<String, GraphDocument>>,
}

impl MemoryGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphMirror for MemoryGraph {
    async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        let _ = self.namespaces.write().expect("lock not poisoned").remove(namespace);
        Ok(())
    }

    async fn write(&self, document: &GraphDocument) -> Result<()> {
        let mut namespaces = self.namespaces.write().expect("lock not poisoned");
        let entry = namespaces.entry(document.namespace.clone()).or_insert_with(|| GraphDocument {
            namespace: document.namespace.clone(),
            nodes: Vec::new(),
            relationships: Vec::new(),
        });

        entry.nodes.extend(document.nodes.iter().cloned());
        entry.relationships.extend(document.relationships.iter().cloned());
        Ok(())
    }

    async fn load(&self, namespace: &str) -> Result<Option<GraphDocument>> {
        Ok(self.namespaces.read().expect("lock not poisoned").get(namespace).cloned())
    }
}
