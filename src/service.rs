//! The exposed repository boundary.
//!
//! [`RepositoryService::select_repository`] resolves a repository, aggregates it, replaces
//! the stored record, and mirrors it into the graph. Only identity resolution can make it
//! fail; everything after that degrades or is logged.

use crate::Result;
use crate::analysis::{AggregateAnalysis, Aggregator, AnalysisSettings, RepoName, Repository};
use crate::graph::{GraphDocument, GraphMirror, NoGraph};
use crate::hosting::{HostingApi, HostingApiResult};
use crate::store::AnalysisStore;
use chrono::Utc;
use std::sync::Arc;

const LOG_TARGET: &str = "   service";

/// Outcome of an operation at the exposed boundary.
#[derive(Debug, Clone)]
pub enum ProviderResult<T> {
    /// The operation succeeded and data was found.
    Found(T),

    /// The repository does not exist upstream or has never been stored.
    NotFound(String),

    /// The caller's input was rejected before any request was made.
    Invalid(String),

    /// The repository identity could not be resolved because of a transient failure.
    Error(Arc<ohno::AppError>),
}

impl<T> ProviderResult<T> {
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    #[must_use]
    pub const fn as_ref(&self) -> Option<&T> {
        match self {
            Self::Found(data) => Some(data),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Found(data) => Ok(data),
            Self::NotFound(reason) | Self::Invalid(reason) => Err(ohno::app_err!("{reason}")),
            Self::Error(e) => Err(ohno::app_err!("{e:#}")),
        }
    }
}

/// A repository together with its freshly stored analysis.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Selection {
    pub repository: Repository,
    pub analysis: AggregateAnalysis,
}

/// Ties the upstream, the store, and the graph mirror together.
#[derive(Debug)]
pub struct RepositoryService<A, S, G = NoGraph> {
    aggregator: Aggregator<A>,
    store: S,
    graph: G,
}

impl<A: HostingApi, S: AnalysisStore> RepositoryService<A, S, NoGraph> {
    #[must_use]
    pub const fn new(api: Arc<A>, store: S, settings: AnalysisSettings) -> Self {
        Self {
            aggregator: Aggregator::new(api, settings),
            store,
            graph: NoGraph,
        }
    }
}

impl<A: HostingApi, S: AnalysisStore, G: GraphMirror> RepositoryService<A, S, G> {
    /// Mirror every selection into `graph`.
    #[must_use]
    pub fn with_graph<H: GraphMirror>(self, graph: H) -> RepositoryService<A, S, H> {
        RepositoryService {
            aggregator: self.aggregator,
            store: self.store,
            graph,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn graph(&self) -> &G {
        &self.graph
    }

    /// Resolve, aggregate, store, and mirror a repository.
    ///
    /// Calling this again for the same repository refreshes it: the stored record and
    /// the graph namespace are replaced, never merged.
    pub async fn select_repository(&self, full_name: &str) -> ProviderResult<Selection> {
        let name = match RepoName::parse(full_name) {
            Ok(name) => name,
            Err(e) => return ProviderResult::Invalid(e.to_string()),
        };

        let repository = match self.aggregator.api().repository(&name).await {
            HostingApiResult::Success(repository, _) => repository,
            HostingApiResult::NotFound(_) => return ProviderResult::NotFound(format!("repository '{name}' not found")),
            HostingApiResult::RateLimited(rate_limit) => {
                return ProviderResult::Error(Arc::new(ohno::app_err!(
                    "rate limited while resolving '{name}', resets at {}",
                    rate_limit.reset_at
                )));
            }
            HostingApiResult::Failed(e, _) => {
                log::error!(target: LOG_TARGET, "Could not resolve repository '{name}': {e:#}");
                return ProviderResult::Error(Arc::new(e));
            }
        };

        let analysis = self.aggregator.aggregate(&repository, Utc::now()).await;

        if let Err(e) = self.store.put(&analysis) {
            log::error!(target: LOG_TARGET, "Could not store analysis for '{name}': {e:#}");
        }

        self.mirror(&analysis).await;

        ProviderResult::Found(Selection { repository, analysis })
    }

    /// The stored analysis for `repository_id`.
    pub fn analysis(&self, repository_id: u64) -> Result<ProviderResult<AggregateAnalysis>> {
        Ok(match self.store.get(repository_id)? {
            Some(analysis) => ProviderResult::Found(analysis),
            None => ProviderResult::NotFound(format!("no analysis stored for repository {repository_id}")),
        })
    }

    async fn mirror(&self, analysis: &AggregateAnalysis) {
        let document = GraphDocument::project(analysis);
        let namespace = document.namespace.as_str();

        if let Err(e) = self.graph.delete_namespace(namespace).await {
            log::warn!(target: LOG_TARGET, "Could not clear graph namespace '{namespace}': {e:#}");
            return;
        }

        if let Err(e) = self.graph.write(&document).await {
            log::warn!(target: LOG_TARGET, "Could not mirror '{namespace}' into the graph: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{CountBasis, ResourceCount, ResourceKind};
    use crate::graph::MemoryGraph;
    use crate::hosting::fake::{FakeApi, FakeRepo, Fault};
    use crate::store::MemoryStore;
    use ohno::bail;

    #[derive(Debug, Default)]
    struct BrokenGraph;

    impl GraphMirror for BrokenGraph {
        async fn delete_namespace(&self, _namespace: &str) -> Result<()> {
            Ok(())
        }

        async fn write(&self, _document: &GraphDocument) -> Result<()> {
            bail!("graph unavailable")
        }

        async fn load(&self, _namespace: &str) -> Result<Option<GraphDocument>> {
            bail!("graph unavailable")
        }
    }

    #[derive(Debug, Default)]
    struct BrokenStore;

    impl AnalysisStore for BrokenStore {
        fn get(&self, _repository_id: u64) -> Result<Option<AggregateAnalysis>> {
            bail!("disk full")
        }

        fn put(&self, _analysis: &AggregateAnalysis) -> Result<()> {
            bail!("disk full")
        }
    }

    fn repo() -> FakeRepo {
        FakeRepo::new("o/r")
            .id(77)
            .commits(150)
            .issues(100, 30, 10)
            .pull_requests(12, 3)
            .releases(4)
            .contributors(6)
    }

    fn service(api: FakeApi) -> RepositoryService<FakeApi, MemoryStore, MemoryGraph> {
        RepositoryService::new(Arc::new(api), MemoryStore::new(), AnalysisSettings::default()).with_graph(MemoryGraph::new())
    }

    #[tokio::test]
    async fn test_select_stores_and_mirrors() {
        let service = service(FakeApi::new(repo()));

        let selection = service.select_repository("o/r").await.into_result().unwrap();
        assert_eq!(selection.repository.id(), 77);
        assert_eq!(selection.analysis.counts.total_commits, ResourceCount::exact(ResourceKind::Commits, 150));
        assert_eq!(selection.analysis.counts.total_issues, ResourceCount::exact(ResourceKind::Issues, 70));

        let stored = service.analysis(77).unwrap();
        assert_eq!(stored.as_ref(), Some(&selection.analysis));

        let mirrored = service.graph().load("o/r").await.unwrap().unwrap();
        assert_eq!(mirrored, GraphDocument::project(&selection.analysis));
    }

    #[tokio::test]
    async fn test_refresh_replaces_everything() {
        let api = Arc::new(FakeApi::new(repo()));
        let service = RepositoryService::new(Arc::clone(&api), MemoryStore::new(), AnalysisSettings::default())
            .with_graph(MemoryGraph::new());

        let first = service.select_repository("o/r").await.into_result().unwrap();
        assert_eq!(first.analysis.releases.len(), 4);

        api.set_repo(FakeRepo::new("o/r").id(77).commits(20).issues(5, 0, 1));
        let second = service.select_repository("o/r").await.into_result().unwrap();

        let stored = service.analysis(77).unwrap().into_result().unwrap();
        assert_eq!(stored, second.analysis);
        assert_eq!(stored.commits.len(), 20);
        assert!(stored.releases.is_empty());
        assert!(stored.pull_requests.is_empty());
        assert!(stored.contributors.is_empty());
        assert_eq!(service.store().len(), 1);

        let mirrored = service.graph().load("o/r").await.unwrap().unwrap();
        assert_eq!(mirrored, GraphDocument::project(&second.analysis));
    }

    #[tokio::test]
    async fn test_graph_failure_is_isolated() {
        let service = RepositoryService::new(Arc::new(FakeApi::new(repo())), MemoryStore::new(), AnalysisSettings::default())
            .with_graph(BrokenGraph);

        let selection = service.select_repository("o/r").await.into_result().unwrap();
        assert_eq!(selection.analysis.commits.len(), 150);
        assert!(service.analysis(77).unwrap().is_found());
    }

    #[tokio::test]
    async fn test_store_failure_still_returns_analysis() {
        let service = RepositoryService::new(Arc::new(FakeApi::new(repo())), BrokenStore, AnalysisSettings::default());

        let selection = service.select_repository("o/r").await;
        assert!(selection.is_found());
        let _ = service.analysis(77).unwrap_err();
    }

    #[tokio::test]
    async fn test_invalid_name() {
        let service = service(FakeApi::new(repo()));

        let result = service.select_repository("not a repo").await;
        assert!(matches!(result, ProviderResult::Invalid(_)));
    }

    #[tokio::test]
    async fn test_unknown_repository() {
        let api = FakeApi::empty();
        let service = service(api);

        let result = service.select_repository("o/r").await;
        assert!(matches!(result, ProviderResult::NotFound(_)));
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn test_identity_failure_is_an_error() {
        let service = service(FakeApi::new(repo()).fail_repository(Fault::Fail));

        let result = service.select_repository("o/r").await;
        assert!(matches!(result, ProviderResult::Error(_)));
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn test_identity_rate_limited_is_an_error() {
        let service = service(FakeApi::new(repo()).fail_repository(Fault::RateLimit));

        let result = service.select_repository("o/r").await;
        assert!(matches!(result, ProviderResult::Error(_)));
    }

    #[tokio::test]
    async fn test_degraded_resources_still_stored() {
        let api = FakeApi::new(repo()).fail_kind(ResourceKind::Contributors).fail_page(ResourceKind::Commits, 2);
        let service = service(api);

        let selection = service.select_repository("o/r").await.into_result().unwrap();
        assert!(selection.analysis.contributors.is_empty());
        assert_eq!(selection.analysis.counts.total_contributors, ResourceCount::degraded(ResourceKind::Contributors));
        assert_eq!(selection.analysis.counts.total_commits.basis, CountBasis::Capped);
        assert_eq!(selection.analysis.releases.len(), 4);
        assert!(service.analysis(77).unwrap().is_found());
    }

    #[tokio::test]
    async fn test_missing_analysis() {
        let service = service(FakeApi::new(repo()));
        assert!(matches!(service.analysis(1).unwrap(), ProviderResult::NotFound(_)));
    }
}
