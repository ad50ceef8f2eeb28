//! Total counts for resources too large to enumerate.
//!
//! The primary technique is the last page: fetch page 1 to learn the advertised last
//! page number, then either fetch that last page for an exact total or extrapolate
//! from it. Issues go through the search endpoint first, because the issues listing
//! interleaves pull requests that must not be counted.

use super::{
    AnalysisSettings, CollectPlan, Collector, Commit, Contributor, Issue, LOG_TARGET, PageRequest, PaginationOutcome,
    PullRequest, RawResourcePage, Release, RepoName, Repository, Resource, ResourceCount, ResourceKind, StateFilter,
    degrade,
};
use crate::hosting::{HostingApi, HostingApiResult};

/// Derives [`ResourceCount`]s for one repository.
#[derive(Debug)]
pub struct Estimator<'a, A> {
    api: &'a A,
    settings: &'a AnalysisSettings,
}

impl<'a, A: HostingApi> Estimator<'a, A> {
    #[must_use]
    pub const fn new(api: &'a A, settings: &'a AnalysisSettings) -> Self {
        Self { api, settings }
    }

    /// Count any resource. The total for issues excludes pull requests.
    pub async fn estimate_count(&self, kind: ResourceKind, repo: &Repository) -> ResourceCount {
        let name = repo.full_name();
        match kind {
            ResourceKind::Commits => self.total_commits(name).await,
            ResourceKind::Contributors => self.total_contributors(name).await,
            ResourceKind::Issues => self.total_issues(name).await,
            ResourceKind::PullRequests => self.enumerate::<PullRequest>(name).await,
            ResourceKind::Releases => self.enumerate::<Release>(name).await,
        }
    }

    pub async fn total_commits(&self, name: &RepoName) -> ResourceCount {
        self.last_page_count::<Commit>(name, self.settings.commit_exact_page_limit, self.settings.commit_last_page_fill)
            .await
    }

    /// Anonymous contributors are included, matching the contributor listing.
    pub async fn total_contributors(&self, name: &RepoName) -> ResourceCount {
        self.last_page_count::<Contributor>(
            name,
            self.settings.contributor_exact_page_limit,
            self.settings.contributor_last_page_fill,
        )
        .await
    }

    /// All issues ever opened, excluding pull requests.
    pub async fn total_issues(&self, name: &RepoName) -> ResourceCount {
        if let Some(count) = self.searched_issue_count(name, StateFilter::All).await {
            return count;
        }

        self.filtered_issue_count(name, StateFilter::All).await
    }

    /// Currently open issues, excluding pull requests.
    ///
    /// Without a usable search result, either paginates the open listing with the
    /// pull-request filter or, when strict filtering is off, trusts the repository's own
    /// counter.
    pub async fn open_issues(&self, repo: &Repository) -> ResourceCount {
        let name = repo.full_name();
        if let Some(count) = self.searched_issue_count(name, StateFilter::Open).await {
            return count;
        }

        if !self.settings.strict_issue_filtering
            && let Some(counter) = repo.open_issues_counter
        {
            return ResourceCount::exact(ResourceKind::Issues, counter);
        }

        self.filtered_issue_count(name, StateFilter::Open).await
    }

    async fn fetch<R: Resource>(&self, name: &RepoName, page: u32, state: StateFilter) -> Option<RawResourcePage<R>> {
        let request = PageRequest::new(page, R::KIND.page_size(), state);
        let result = self.api.list_page::<R>(name, request).await;
        degrade::accept(result, name, format_args!("{} page {page}", R::KIND))
    }

    /// The last-page technique.
    ///
    /// With `n` the advertised last page, the total is `(n - 1) * per_page` plus the size
    /// of page `n`. That page is fetched when `n <= exact_page_limit`; beyond that its size
    /// is assumed to be `fill * per_page`.
    async fn last_page_count<R: Resource>(&self, name: &RepoName, exact_page_limit: u32, fill: f64) -> ResourceCount {
        let per_page = R::KIND.page_size();
        let Some(first) = self.fetch::<R>(name, 1, StateFilter::All).await else {
            return ResourceCount::degraded(R::KIND);
        };

        let first_len = first.counted_len() as u64;
        if first.is_final(per_page) {
            return ResourceCount::exact(R::KIND, first_len);
        }

        let Some(last_page) = first.last_page_number.filter(|&n| n > 1) else {
            log::debug!(target: LOG_TARGET, "No last page advertised for {} of '{name}'", R::KIND);
            return self.count_past_first::<R>(name, first_len, StateFilter::All).await;
        };

        let full_pages = u64::from(last_page - 1) * u64::from(per_page);

        if last_page <= exact_page_limit {
            return match self.fetch::<R>(name, last_page, StateFilter::All).await {
                Some(last) => ResourceCount::exact(R::KIND, full_pages + last.counted_len() as u64),
                None => ResourceCount::degraded(R::KIND),
            };
        }

        ResourceCount::estimated(R::KIND, full_pages + assumed_last_page_len(per_page, fill))
    }

    async fn searched_issue_count(&self, name: &RepoName, state: StateFilter) -> Option<ResourceCount> {
        match self.api.search_issue_count(name, state).await {
            HostingApiResult::Success(count, _) if count.incomplete => Some(ResourceCount::estimated(ResourceKind::Issues, count.total)),
            HostingApiResult::Success(count, _) => Some(ResourceCount::exact(ResourceKind::Issues, count.total)),
            other => {
                let _ = degrade::accept(other, name, "issue search");
                log::debug!(target: LOG_TARGET, "Falling back to paginated issue count for '{name}'");
                None
            }
        }
    }

    /// Count issues by paginating the listing and dropping pull requests.
    ///
    /// Small listings are enumerated in full. Large ones are extrapolated from the
    /// proportion of real issues on the first page plus the counted size of the last page.
    async fn filtered_issue_count(&self, name: &RepoName, state: StateFilter) -> ResourceCount {
        let per_page = ResourceKind::Issues.page_size();
        let Some(first) = self.fetch::<Issue>(name, 1, state).await else {
            return ResourceCount::degraded(ResourceKind::Issues);
        };

        let first_counted = first.counted_len() as u64;
        if first.is_final(per_page) {
            return ResourceCount::exact(ResourceKind::Issues, first_counted);
        }

        let Some(last_page) = first.last_page_number.filter(|&n| n > 1) else {
            return self.count_past_first::<Issue>(name, first_counted, state).await;
        };

        if last_page <= self.settings.issue_exact_page_limit {
            let plan = CollectPlan::count_only(ResourceKind::Issues, last_page, state);
            let walked = Collector::new(self.api).collect_from::<Issue>(name, plan, 2).await;
            let counted = first_counted + walked.enumerated;
            return match walked.outcome {
                PaginationOutcome::Exhausted { .. } => ResourceCount::exact(ResourceKind::Issues, counted),
                PaginationOutcome::BudgetReached => ResourceCount::capped(ResourceKind::Issues, counted),
                PaginationOutcome::Failed => ResourceCount::degraded(ResourceKind::Issues),
            };
        }

        let Some(last) = self.fetch::<Issue>(name, last_page, state).await else {
            return ResourceCount::degraded(ResourceKind::Issues);
        };

        #[expect(clippy::cast_precision_loss, reason = "page sizes are tiny")]
        let issue_ratio = first_counted as f64 / first.raw_count.max(1) as f64;
        let full_pages = f64::from(last_page - 1) * f64::from(per_page);

        ResourceCount::estimated(ResourceKind::Issues, round_to_count(full_pages * issue_ratio) + last.counted_len() as u64)
    }

    /// Count a listing whose full first page came without a last-page link.
    ///
    /// Page 2 settles it when it ends the listing; otherwise the count is a lower bound.
    async fn count_past_first<R: Resource>(&self, name: &RepoName, first_counted: u64, state: StateFilter) -> ResourceCount {
        let Some(second) = self.fetch::<R>(name, 2, state).await else {
            return ResourceCount::capped(R::KIND, first_counted);
        };

        let counted = first_counted + second.counted_len() as u64;
        if second.is_final(R::KIND.page_size()) {
            ResourceCount::exact(R::KIND, counted)
        } else {
            ResourceCount::capped(R::KIND, counted)
        }
    }

    /// Count a listing by walking it in full, up to the configured page budget.
    async fn enumerate<R: Resource>(&self, name: &RepoName) -> ResourceCount {
        let plan = CollectPlan::count_only(R::KIND, self.settings.listing_count_max_pages, StateFilter::All);
        let walked = Collector::new(self.api).collect::<R>(name, plan).await;

        if walked.outcome == PaginationOutcome::Failed && walked.pages_fetched == 0 {
            return ResourceCount::degraded(R::KIND);
        }

        walked.count()
    }
}

fn assumed_last_page_len(per_page: u8, fill: f64) -> u64 {
    round_to_count(f64::from(per_page) * fill.clamp(0.0, 1.0)).max(1)
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "value is non-negative and bounded")]
fn round_to_count(value: f64) -> u64 {
    value.max(0.0).round() as u64
}
