use super::{Commit, Contributor, CountSet, Issue, PullRequest, Release, RepoName};
use crate::hosting::wire::RepositoryWire;
use chrono::{DateTime, Utc};
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Window used by the recent-activity metrics.
const RECENT_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Stable identity of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    pub id: u64,
    pub full_name: RepoName,
}

/// Repository metadata as returned by identity resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub identity: RepositoryIdentity,
    pub description: Option<String>,
    pub html_url: Option<String>,
    pub default_branch: Option<String>,
    pub stars: u64,
    pub forks: u64,

    /// The upstream's own open-issue counter. On GitHub it includes open pull requests.
    pub open_issues_counter: Option<u64>,
    pub pushed_at: Option<DateTime<Utc>>,
}

impl Repository {
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.identity.id
    }

    #[must_use]
    pub const fn full_name(&self) -> &RepoName {
        &self.identity.full_name
    }
}

impl TryFrom<RepositoryWire> for Repository {
    type Error = ohno::AppError;

    fn try_from(wire: RepositoryWire) -> crate::Result<Self> {
        Ok(Self {
            identity: RepositoryIdentity {
                id: wire.id,
                full_name: RepoName::parse(&wire.full_name)?,
            },
            description: wire.description,
            html_url: wire.html_url,
            default_branch: wire.default_branch,
            stars: wire.stargazers_count,
            forks: wire.forks_count,
            open_issues_counter: wire.open_issues_count,
            pushed_at: wire.pushed_at,
        })
    }
}

/// Metrics computed from the collected sequences only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub commits_last_7_days: u64,
    pub active_authors_last_7_days: u64,
    pub open_pull_requests: u64,
    pub merged_pull_requests: u64,
    pub latest_release: Option<String>,
}

impl DerivedMetrics {
    #[must_use]
    pub fn compute(commits: &[Commit], pull_requests: &[PullRequest], releases: &[Release], now: DateTime<Utc>) -> Self {
        let window_start = now - RECENT_WINDOW;
        let recent: Vec<_> = commits
            .iter()
            .filter(|c| c.authored_at.is_some_and(|at| at >= window_start && at <= now))
            .collect();

        let authors: HashSet<_> = recent.iter().filter_map(|c| c.author_key()).collect();

        let latest_release = releases
            .iter()
            .filter(|r| !r.draft)
            .filter_map(|r| r.published_at.map(|at| (at, r)))
            .max_by_key(|(at, _)| *at)
            .map(|(_, r)| r.tag.clone());

        Self {
            commits_last_7_days: recent.len() as u64,
            active_authors_last_7_days: authors.len() as u64,
            open_pull_requests: pull_requests.iter().filter(|pr| pr.is_open()).count() as u64,
            merged_pull_requests: pull_requests.iter().filter(|pr| pr.is_merged()).count() as u64,
            latest_release,
        }
    }
}

/// The aggregated data kept for one repository.
///
/// Produced whole by each aggregation; a refresh replaces it entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateAnalysis {
    pub repository: RepositoryIdentity,
    pub commits: Vec<Commit>,
    pub pull_requests: Vec<PullRequest>,

    /// Never contains entries flagged as pull requests.
    pub issues: Vec<Issue>,
    pub releases: Vec<Release>,
    pub contributors: Vec<Contributor>,
    pub counts: CountSet,
    pub derived: DerivedMetrics,
    pub last_updated: DateTime<Utc>,
}
