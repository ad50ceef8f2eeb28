use super::degrade::within_deadline;
use super::{
    AggregateAnalysis, AnalysisSettings, CollectPlan, Collected, Collector, Commit, Contributor, CountSet, DerivedMetrics,
    Estimator, Issue, LOG_TARGET, PullRequest, Release, Repository, ResourceCount, ResourceKind,
};
use crate::hosting::HostingApi;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Builds an [`AggregateAnalysis`] from every upstream listing of a repository.
#[derive(Debug)]
pub struct Aggregator<A> {
    api: Arc<A>,
    settings: AnalysisSettings,
}

impl<A: HostingApi> Aggregator<A> {
    #[must_use]
    pub const fn new(api: Arc<A>, settings: AnalysisSettings) -> Self {
        Self { api, settings }
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub const fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Collect, count, reconcile, and derive.
    ///
    /// All collections and count estimations run concurrently and each is bounded by the
    /// task timeout. Nothing here fails: a failed or timed-out task contributes an empty
    /// or truncated sequence and a `CAPPED` count.
    pub async fn aggregate(&self, repository: &Repository, now: DateTime<Utc>) -> AggregateAnalysis {
        let name = repository.full_name();
        let settings = &self.settings;
        let deadline = settings.task_timeout;
        let collector = Collector::new(&*self.api);
        let estimator = Estimator::new(&*self.api, settings);

        log::info!(target: LOG_TARGET, "Aggregating '{name}'");

        let (commits, pull_requests, issues, releases, contributors, commit_count, contributor_count, issue_count, open_issue_count) = tokio::join!(
            within_deadline(
                deadline,
                name,
                ResourceKind::Commits,
                collector.collect::<Commit>(name, CollectPlan::items(ResourceKind::Commits, settings)),
                Collected::degraded
            ),
            within_deadline(
                deadline,
                name,
                ResourceKind::PullRequests,
                collector.collect::<PullRequest>(name, CollectPlan::items(ResourceKind::PullRequests, settings)),
                Collected::degraded
            ),
            within_deadline(
                deadline,
                name,
                ResourceKind::Issues,
                collector.collect::<Issue>(name, CollectPlan::items(ResourceKind::Issues, settings)),
                Collected::degraded
            ),
            within_deadline(
                deadline,
                name,
                ResourceKind::Releases,
                collector.collect::<Release>(name, CollectPlan::items(ResourceKind::Releases, settings)),
                Collected::degraded
            ),
            within_deadline(
                deadline,
                name,
                ResourceKind::Contributors,
                collector.collect::<Contributor>(name, CollectPlan::items(ResourceKind::Contributors, settings)),
                Collected::degraded
            ),
            within_deadline(deadline, name, "commit count", estimator.total_commits(name), || {
                ResourceCount::degraded(ResourceKind::Commits)
            }),
            within_deadline(deadline, name, "contributor count", estimator.total_contributors(name), || {
                ResourceCount::degraded(ResourceKind::Contributors)
            }),
            within_deadline(deadline, name, "issue count", estimator.total_issues(name), || {
                ResourceCount::degraded(ResourceKind::Issues)
            }),
            within_deadline(deadline, name, "open issue count", estimator.open_issues(repository), || {
                ResourceCount::degraded(ResourceKind::Issues)
            }),
        );

        let counts = CountSet {
            total_commits: commits.reconcile(commit_count),
            total_contributors: contributors.reconcile(contributor_count),
            total_issues: issues.reconcile(issue_count),
            total_pull_requests: pull_requests.count(),
            total_releases: releases.count(),
            open_issues: reconcile_open_issues(&issues, open_issue_count),
        }
        .with_issue_bound();

        let derived = DerivedMetrics::compute(&commits.items, &pull_requests.items, &releases.items, now);

        log::info!(
            target: LOG_TARGET,
            "Aggregated '{name}': {} commits ({:?}), {} issues ({:?}), {} pull requests ({:?})",
            counts.total_commits.value,
            counts.total_commits.basis,
            counts.total_issues.value,
            counts.total_issues.basis,
            counts.total_pull_requests.value,
            counts.total_pull_requests.basis
        );

        AggregateAnalysis {
            repository: repository.identity.clone(),
            commits: commits.items,
            pull_requests: pull_requests.items,
            issues: issues.items,
            releases: releases.items,
            contributors: contributors.items,
            counts,
            derived,
            last_updated: now,
        }
    }
}

/// When every issue was retained, the open count can be read off the collection.
fn reconcile_open_issues(issues: &Collected<Issue>, count: ResourceCount) -> ResourceCount {
    let open_collected = issues.items.iter().filter(|i| i.is_open()).count() as u64;

    if issues.is_complete() {
        return ResourceCount::exact(ResourceKind::Issues, open_collected);
    }

    count.at_least(open_collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{CountBasis, RepoName};
    use crate::hosting::HostingApiResult;
    use crate::hosting::fake::{FakeApi, FakeRepo, SearchMode, epoch};
    use core::time::Duration;

    async fn run(api: FakeApi, settings: AnalysisSettings) -> (AggregateAnalysis, Arc<FakeApi>) {
        let api = Arc::new(api);
        let repo = match api.repository(&RepoName::parse("o/r").unwrap()).await {
            HostingApiResult::Success(repo, _) => repo,
            other => panic!("unexpected {other:?}"),
        };

        let analysis = Aggregator::new(Arc::clone(&api), settings).aggregate(&repo, epoch()).await;
        (analysis, api)
    }

    fn full_repo() -> FakeRepo {
        FakeRepo::new("o/r")
            .commits(150)
            .issues(100, 30, 12)
            .pull_requests(40, 6)
            .releases(8)
            .contributors(25)
    }

    #[tokio::test]
    async fn test_small_repository_is_exact() {
        let (analysis, _) = run(FakeApi::new(full_repo()), AnalysisSettings::default()).await;

        assert_eq!(analysis.commits.len(), 150);
        assert_eq!(analysis.issues.len(), 70);
        assert_eq!(analysis.pull_requests.len(), 40);
        assert_eq!(analysis.releases.len(), 8);
        assert_eq!(analysis.contributors.len(), 25);

        let counts = analysis.counts;
        assert_eq!(counts.total_commits, ResourceCount::exact(ResourceKind::Commits, 150));
        assert_eq!(counts.total_issues, ResourceCount::exact(ResourceKind::Issues, 70));
        assert_eq!(counts.open_issues, ResourceCount::exact(ResourceKind::Issues, 12));
        assert_eq!(counts.total_pull_requests, ResourceCount::exact(ResourceKind::PullRequests, 40));
        assert_eq!(counts.total_releases, ResourceCount::exact(ResourceKind::Releases, 8));
        assert_eq!(counts.total_contributors, ResourceCount::exact(ResourceKind::Contributors, 25));

        assert_eq!(analysis.derived.open_pull_requests, 6);
        assert_eq!(analysis.derived.latest_release.as_deref(), Some("v0.8.0"));
        assert_eq!(analysis.last_updated, epoch());
    }

    #[tokio::test]
    async fn test_caps_hold_for_large_repository() {
        let repo = FakeRepo::new("o/r")
            .commits(2000)
            .issues(900, 100, 50)
            .pull_requests(400, 10)
            .releases(120)
            .contributors(700);
        let (analysis, _) = run(FakeApi::new(repo), AnalysisSettings::default()).await;

        assert_eq!(analysis.commits.len(), 300);
        assert_eq!(analysis.issues.len(), 500);
        assert_eq!(analysis.contributors.len(), 500);
        assert_eq!(analysis.releases.len(), 50);
        assert_eq!(analysis.pull_requests.len(), 300);
        assert!(analysis.issues.iter().all(|i| !i.is_pull_request));

        assert_eq!(analysis.counts.total_commits, ResourceCount::exact(ResourceKind::Commits, 2000));
        assert_eq!(analysis.counts.total_issues, ResourceCount::exact(ResourceKind::Issues, 800));
        assert_eq!(analysis.counts.total_releases, ResourceCount::exact(ResourceKind::Releases, 120));
        assert_eq!(analysis.counts.total_pull_requests, ResourceCount::exact(ResourceKind::PullRequests, 400));
        assert!(analysis.counts.open_issues.value <= analysis.counts.total_issues.value);
    }

    #[tokio::test]
    async fn test_commit_page_two_failure_truncates_commits_only() {
        let api = FakeApi::new(full_repo()).fail_page(ResourceKind::Commits, 2);
        let (analysis, _) = run(api, AnalysisSettings::default()).await;

        assert_eq!(analysis.commits.len(), 100);
        assert_eq!(analysis.counts.total_commits.basis, CountBasis::Capped);
        assert_eq!(analysis.counts.total_commits.value, 100);

        assert_eq!(analysis.issues.len(), 70);
        assert_eq!(analysis.counts.total_issues, ResourceCount::exact(ResourceKind::Issues, 70));
        assert_eq!(analysis.contributors.len(), 25);
        assert_eq!(analysis.releases.len(), 8);
    }

    #[tokio::test]
    async fn test_rate_limited_resource_degrades() {
        let api = FakeApi::new(full_repo()).rate_limit_page(ResourceKind::Releases, 1);
        let (analysis, _) = run(api, AnalysisSettings::default()).await;

        assert!(analysis.releases.is_empty());
        assert_eq!(analysis.counts.total_releases, ResourceCount::degraded(ResourceKind::Releases));
        assert!(analysis.derived.latest_release.is_none());
        assert_eq!(analysis.commits.len(), 150);
    }

    #[tokio::test]
    async fn test_slow_resource_times_out() {
        let api = FakeApi::new(full_repo()).delay(ResourceKind::Contributors, Duration::from_secs(5));
        let settings = AnalysisSettings {
            task_timeout: Duration::from_millis(50),
            ..AnalysisSettings::default()
        };
        let (analysis, _) = run(api, settings).await;

        assert!(analysis.contributors.is_empty());
        assert_eq!(analysis.counts.total_contributors, ResourceCount::degraded(ResourceKind::Contributors));
        assert_eq!(analysis.commits.len(), 150);
    }

    #[tokio::test]
    async fn test_search_totals_are_used() {
        let api = FakeApi::new(full_repo()).search(SearchMode::Complete);
        let (analysis, _) = run(api, AnalysisSettings::default()).await;

        assert_eq!(analysis.counts.total_issues, ResourceCount::exact(ResourceKind::Issues, 70));
        assert_eq!(analysis.counts.open_issues, ResourceCount::exact(ResourceKind::Issues, 12));
    }

    #[tokio::test]
    async fn test_repeated_runs_agree() {
        let repo = FakeRepo::new("o/r").commits(5000).contributors(900).issues(300, 20, 40);
        let settings = AnalysisSettings {
            commit_exact_page_limit: 10,
            contributor_exact_page_limit: 2,
            ..AnalysisSettings::default()
        };

        let (first, _) = run(FakeApi::new(repo.clone()), settings.clone()).await;
        let (second, _) = run(FakeApi::new(repo), settings).await;

        for (a, b) in [
            (first.counts.total_commits, second.counts.total_commits),
            (first.counts.total_contributors, second.counts.total_contributors),
            (first.counts.total_issues, second.counts.total_issues),
        ] {
            assert_eq!(a.basis, b.basis);
            if a.is_exact() {
                assert_eq!(a.value, b.value);
            } else {
                assert!(a.value.abs_diff(b.value) * 5 <= a.value.max(b.value));
            }
        }

        assert_eq!(first.counts.total_commits.basis, CountBasis::Estimated);
        assert_eq!(first.counts.total_contributors.basis, CountBasis::Estimated);
        assert_eq!(first.counts.total_issues, ResourceCount::exact(ResourceKind::Issues, 280));
    }

    #[tokio::test]
    async fn test_open_issues_never_exceed_total() {
        let api = FakeApi::new(FakeRepo::new("o/r").issues(50, 0, 50).open_issues_counter(80));
        let settings = AnalysisSettings {
            strict_issue_filtering: false,
            ..AnalysisSettings::default()
        };
        let (analysis, _) = run(api, settings).await;

        assert_eq!(analysis.counts.total_issues, ResourceCount::exact(ResourceKind::Issues, 50));
        assert_eq!(analysis.counts.open_issues, ResourceCount::exact(ResourceKind::Issues, 50));
    }

    #[test]
    fn test_reconcile_open_issues_uses_bound_when_incomplete() {
        let issues = Collected::<Issue>::degraded();
        let count = ResourceCount::estimated(ResourceKind::Issues, 17);

        assert_eq!(reconcile_open_issues(&issues, count), count);
    }
}
