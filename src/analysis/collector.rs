use super::{AnalysisSettings, CountBasis, LOG_TARGET, PageRequest, RepoName, Resource, ResourceCount, ResourceKind, StateFilter, degrade};
use crate::hosting::HostingApi;

/// How far to walk one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectPlan {
    pub page_size: u8,
    pub max_pages: u32,

    /// Items kept in the result; everything beyond is only counted.
    pub retain: usize,
    pub state: StateFilter,
}

impl CollectPlan {
    /// The plan used to gather a resource's items for an analysis.
    #[must_use]
    pub fn items(kind: ResourceKind, settings: &AnalysisSettings) -> Self {
        let max_pages = match kind {
            ResourceKind::Commits => 3,
            ResourceKind::Issues => 10,
            ResourceKind::Contributors => 5,
            ResourceKind::PullRequests | ResourceKind::Releases => settings.listing_count_max_pages,
        };

        Self {
            page_size: kind.page_size(),
            max_pages,
            retain: kind.retained_cap(),
            state: StateFilter::All,
        }
    }

    /// A plan that only counts.
    #[must_use]
    pub const fn count_only(kind: ResourceKind, max_pages: u32, state: StateFilter) -> Self {
        Self {
            page_size: kind.page_size(),
            max_pages,
            retain: 0,
            state,
        }
    }
}

/// Why pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationOutcome {
    /// The listing ended. `last_page_partial` is set when the final page held fewer
    /// entries than the page size.
    Exhausted { last_page_partial: bool },

    /// The page budget was spent while more pages were advertised.
    BudgetReached,

    /// A page fetch failed; pages gathered before it are kept.
    Failed,
}

impl PaginationOutcome {
    #[must_use]
    pub const fn basis(self) -> CountBasis {
        match self {
            Self::Exhausted { .. } => CountBasis::Exact,
            Self::BudgetReached | Self::Failed => CountBasis::Capped,
        }
    }
}

/// The result of walking one listing.
#[derive(Debug, Clone)]
pub struct Collected<R> {
    /// Counted items in upstream order, at most `retain` of them.
    pub items: Vec<R>,

    /// Counted items seen across every fetched page.
    pub enumerated: u64,
    pub pages_fetched: u32,
    pub outcome: PaginationOutcome,
}

impl<R: Resource> Collected<R> {
    /// An empty result for a collection that never ran.
    #[must_use]
    pub const fn degraded() -> Self {
        Self {
            items: Vec::new(),
            enumerated: 0,
            pages_fetched: 0,
            outcome: PaginationOutcome::Failed,
        }
    }

    /// The count implied by the walk alone.
    #[must_use]
    pub const fn count(&self) -> ResourceCount {
        ResourceCount {
            resource: R::KIND,
            value: self.enumerated,
            basis: self.outcome.basis(),
        }
    }

    /// Whether every counted item of the listing was retained.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, PaginationOutcome::Exhausted { .. }) && self.enumerated == self.items.len() as u64
    }

    /// Combine an independent count with what this walk saw.
    ///
    /// An exhausted walk is authoritative. Otherwise the count can never be below the
    /// number of items enumerated.
    #[must_use]
    pub fn reconcile(&self, count: ResourceCount) -> ResourceCount {
        if matches!(self.outcome, PaginationOutcome::Exhausted { .. }) {
            return ResourceCount::exact(R::KIND, self.enumerated);
        }

        count.at_least(self.enumerated)
    }
}

/// Walks a listing one page at a time, in page order.
#[derive(Debug)]
pub struct Collector<'a, A> {
    api: &'a A,
}

impl<'a, A: HostingApi> Collector<'a, A> {
    #[must_use]
    pub const fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Fetch pages `1..=plan.max_pages` until the listing ends or a fetch fails.
    ///
    /// Items that do not count towards the resource (pull requests in the issues
    /// listing) are dropped and never enumerated.
    pub async fn collect<R: Resource>(&self, repo: &RepoName, plan: CollectPlan) -> Collected<R> {
        self.collect_from(repo, plan, 1).await
    }

    /// Like [`Self::collect`], for a caller that already holds the pages before
    /// `first_page`. Only the pages walked here are enumerated; `pages_fetched` is the
    /// number of the last page fetched.
    pub async fn collect_from<R: Resource>(&self, repo: &RepoName, plan: CollectPlan, first_page: u32) -> Collected<R> {
        let mut collected = Collected {
            items: Vec::with_capacity(plan.retain.min(usize::from(plan.page_size) * plan.max_pages as usize)),
            enumerated: 0,
            pages_fetched: 0,
            outcome: PaginationOutcome::BudgetReached,
        };

        for page in first_page.max(1)..=plan.max_pages {
            let request = PageRequest::new(page, plan.page_size, plan.state);
            let result = self.api.list_page::<R>(repo, request).await;

            let Some(fetched) = degrade::accept(result, repo, format_args!("{} page {page}", R::KIND)) else {
                collected.outcome = PaginationOutcome::Failed;
                break;
            };

            collected.pages_fetched = page;
            let is_final = fetched.is_final(plan.page_size);
            let last_page_partial = fetched.raw_count < usize::from(plan.page_size);

            for item in fetched.items.into_iter().filter(Resource::is_counted) {
                collected.enumerated += 1;
                if collected.items.len() < plan.retain {
                    collected.items.push(item);
                }
            }

            if is_final {
                collected.outcome = PaginationOutcome::Exhausted { last_page_partial };
                break;
            }
        }

        log::debug!(
            target: LOG_TARGET,
            "Collected {} {} for '{repo}' over {} page(s): {:?}",
            collected.enumerated,
            R::KIND,
            collected.pages_fetched,
            collected.outcome
        );

        collected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Commit, Issue};
    use crate::hosting::fake::{FakeApi, FakeRepo};

    fn repo() -> RepoName {
        RepoName::parse("o/r").unwrap()
    }

    fn plan(max_pages: u32, retain: usize) -> CollectPlan {
        CollectPlan {
            page_size: 100,
            max_pages,
            retain,
            state: StateFilter::All,
        }
    }

    #[tokio::test]
    async fn test_short_page_exhausts() {
        let api = FakeApi::new(FakeRepo::new("o/r").commits(150));

        let collected = Collector::new(&api).collect::<Commit>(&repo(), plan(3, 300)).await;
        assert_eq!(collected.items.len(), 150);
        assert_eq!(collected.enumerated, 150);
        assert_eq!(collected.pages_fetched, 2);
        assert_eq!(collected.outcome, PaginationOutcome::Exhausted { last_page_partial: true });
        assert_eq!(collected.count(), ResourceCount::exact(ResourceKind::Commits, 150));
    }

    #[tokio::test]
    async fn test_budget_reached() {
        let api = FakeApi::new(FakeRepo::new("o/r").commits(1000));

        let collected = Collector::new(&api).collect::<Commit>(&repo(), plan(3, 300)).await;
        assert_eq!(collected.items.len(), 300);
        assert_eq!(collected.outcome, PaginationOutcome::BudgetReached);
        assert_eq!(collected.count().basis, CountBasis::Capped);
    }

    #[tokio::test]
    async fn test_exact_multiple_of_page_size() {
        let api = FakeApi::new(FakeRepo::new("o/r").commits(200));

        let collected = Collector::new(&api).collect::<Commit>(&repo(), plan(3, 300)).await;
        assert_eq!(collected.enumerated, 200);
        assert_eq!(collected.outcome, PaginationOutcome::Exhausted { last_page_partial: false });
        assert_eq!(api.requests_for(ResourceKind::Commits), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let api = FakeApi::new(FakeRepo::new("o/r"));

        let collected = Collector::new(&api).collect::<Commit>(&repo(), plan(3, 300)).await;
        assert!(collected.items.is_empty());
        assert_eq!(collected.outcome, PaginationOutcome::Exhausted { last_page_partial: true });
        assert_eq!(collected.count(), ResourceCount::exact(ResourceKind::Commits, 0));
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_pages() {
        let api = FakeApi::new(FakeRepo::new("o/r").commits(250)).fail_page(ResourceKind::Commits, 2);

        let collected = Collector::new(&api).collect::<Commit>(&repo(), plan(3, 300)).await;
        assert_eq!(collected.items.len(), 100);
        assert_eq!(collected.pages_fetched, 1);
        assert_eq!(collected.outcome, PaginationOutcome::Failed);
        assert_eq!(api.requests_for(ResourceKind::Commits), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_pages_requested_in_order() {
        let api = FakeApi::new(FakeRepo::new("o/r").commits(1000));

        let _ = Collector::new(&api).collect::<Commit>(&repo(), plan(5, 0)).await;
        assert_eq!(api.requests_for(ResourceKind::Commits), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_pull_requests_filtered_from_issues() {
        let api = FakeApi::new(FakeRepo::new("o/r").issues(100, 30, 0));

        let collected = Collector::new(&api).collect::<Issue>(&repo(), plan(10, 500)).await;
        assert_eq!(collected.items.len(), 70);
        assert_eq!(collected.enumerated, 70);
        assert!(collected.items.iter().all(|i| !i.is_pull_request));

        // a single full page carries no links, so only the empty page 2 ends the listing
        assert_eq!(collected.outcome, PaginationOutcome::Exhausted { last_page_partial: true });
        assert_eq!(api.requests_for(ResourceKind::Issues), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_full_pages_without_links_keep_walking() {
        let api = FakeApi::new(FakeRepo::new("o/r").commits(250)).without_links(ResourceKind::Commits);

        let collected = Collector::new(&api).collect::<Commit>(&repo(), plan(5, 300)).await;
        assert_eq!(collected.enumerated, 250);
        assert_eq!(collected.outcome, PaginationOutcome::Exhausted { last_page_partial: true });
        assert_eq!(api.requests_for(ResourceKind::Commits), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_collect_from_later_page() {
        let api = FakeApi::new(FakeRepo::new("o/r").commits(250));

        let collected = Collector::new(&api).collect_from::<Commit>(&repo(), plan(3, 300), 2).await;
        assert_eq!(collected.enumerated, 150);
        assert_eq!(collected.pages_fetched, 3);
        assert_eq!(collected.outcome, PaginationOutcome::Exhausted { last_page_partial: true });
        assert_eq!(api.requests_for(ResourceKind::Commits), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_count_only_retains_nothing() {
        let api = FakeApi::new(FakeRepo::new("o/r").commits(250));

        let collected = Collector::new(&api)
            .collect::<Commit>(&repo(), CollectPlan::count_only(ResourceKind::Commits, 10, StateFilter::All))
            .await;
        assert!(collected.items.is_empty());
        assert_eq!(collected.enumerated, 250);
        assert!(!collected.is_complete());
    }

    #[test]
    fn test_reconcile() {
        let exhausted = Collected::<Commit> {
            items: Vec::new(),
            enumerated: 42,
            pages_fetched: 1,
            outcome: PaginationOutcome::Exhausted { last_page_partial: true },
        };
        assert_eq!(
            exhausted.reconcile(ResourceCount::estimated(ResourceKind::Commits, 90)),
            ResourceCount::exact(ResourceKind::Commits, 42)
        );

        let failed = Collected::<Commit> {
            outcome: PaginationOutcome::Failed,
            ..exhausted
        };
        assert_eq!(
            failed.reconcile(ResourceCount::degraded(ResourceKind::Commits)),
            ResourceCount::capped(ResourceKind::Commits, 42)
        );
        assert_eq!(
            failed.reconcile(ResourceCount::estimated(ResourceKind::Commits, 900)),
            ResourceCount::estimated(ResourceKind::Commits, 900)
        );
    }

    #[test]
    fn test_item_plans() {
        let settings = AnalysisSettings::default();

        let commits = CollectPlan::items(ResourceKind::Commits, &settings);
        assert_eq!((commits.page_size, commits.max_pages, commits.retain), (100, 3, 300));

        let issues = CollectPlan::items(ResourceKind::Issues, &settings);
        assert_eq!((issues.page_size, issues.max_pages, issues.retain), (100, 10, 500));

        let contributors = CollectPlan::items(ResourceKind::Contributors, &settings);
        assert_eq!((contributors.max_pages, contributors.retain), (5, 500));

        let releases = CollectPlan::items(ResourceKind::Releases, &settings);
        assert_eq!((releases.page_size, releases.retain), (50, 50));
    }
}
