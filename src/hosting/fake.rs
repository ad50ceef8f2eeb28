//! In-memory [`HostingApi`] used by unit tests.
//!
//! Listings are stored as upstream JSON and decoded through the same wire types the
//! real client uses.

use super::{HostingApi, HostingApiResult, RateLimitInfo, SearchCount};
use crate::analysis::{PageRequest, RawResourcePage, RepoName, Repository, Resource, ResourceKind, StateFilter};
use crate::hosting::wire::RepositoryWire;
use chrono::{DateTime, Duration as TimeDelta, TimeZone, Utc};
use core::time::Duration;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub(crate) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

/// Upstream contents of one repository.
#[derive(Debug, Clone)]
pub(crate) struct FakeRepo {
    id: u64,
    full_name: String,
    open_issues_counter: Option<u64>,
    listings: HashMap<ResourceKind, Vec<Value>>,
}

impl FakeRepo {
    pub(crate) fn new(full_name: &str) -> Self {
        Self {
            id: 1000,
            full_name: full_name.to_string(),
            open_issues_counter: None,
            listings: HashMap::new(),
        }
    }

    pub(crate) fn id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub(crate) fn open_issues_counter(mut self, count: u64) -> Self {
        self.open_issues_counter = Some(count);
        self
    }

    /// `count` commits by four rotating authors, one per hour going back from [`epoch`].
    pub(crate) fn commits(mut self, count: usize) -> Self {
        let entries = (0..count)
            .map(|i| {
                json!({
                    "sha": format!("sha{i:05}"),
                    "commit": {
                        "message": format!("Commit {i}\n\nDetails"),
                        "author": { "name": format!("Author {}", i % 4), "date": epoch() - TimeDelta::hours(i as i64) }
                    },
                    "author": { "login": format!("author{}", i % 4) }
                })
            })
            .collect();
        let _ = self.listings.insert(ResourceKind::Commits, entries);
        self
    }

    /// `entries` issues-listing entries; the first `pull_requests` are pull requests and
    /// the first `open` of the remaining issues are open.
    pub(crate) fn issues(mut self, entries: usize, pull_requests: usize, open: usize) -> Self {
        let entries = (0..entries)
            .map(|i| {
                let is_pr = i < pull_requests;
                let is_open = !is_pr && i - pull_requests < open;
                let mut entry = json!({
                    "number": i + 1,
                    "title": format!("Issue {}", i + 1),
                    "state": if is_open { "open" } else { "closed" },
                    "user": { "login": format!("user{}", i % 3) },
                    "created_at": epoch() - TimeDelta::days(i as i64),
                    "comments": i % 5,
                    "labels": [{ "name": "bug" }]
                });
                if is_pr {
                    entry["pull_request"] = json!({ "merged_at": null });
                }
                entry
            })
            .collect();
        let _ = self.listings.insert(ResourceKind::Issues, entries);
        self
    }

    pub(crate) fn pull_requests(mut self, count: usize, open: usize) -> Self {
        let entries = (0..count)
            .map(|i| {
                json!({
                    "number": 10_000 + i,
                    "title": format!("PR {i}"),
                    "state": if i < open { "open" } else { "closed" },
                    "user": { "login": format!("author{}", i % 4) },
                    "created_at": epoch() - TimeDelta::days(i as i64),
                    "merged_at": if i >= open { Some(epoch()) } else { None },
                    "draft": false
                })
            })
            .collect();
        let _ = self.listings.insert(ResourceKind::PullRequests, entries);
        self
    }

    pub(crate) fn releases(mut self, count: usize) -> Self {
        let entries = (0..count)
            .map(|i| {
                json!({
                    "tag_name": format!("v0.{}.0", count - i),
                    "name": format!("Release {}", count - i),
                    "author": { "login": "author0" },
                    "published_at": epoch() - TimeDelta::days(i as i64 * 7),
                    "prerelease": false,
                    "draft": false
                })
            })
            .collect();
        let _ = self.listings.insert(ResourceKind::Releases, entries);
        self
    }

    pub(crate) fn contributors(mut self, count: usize) -> Self {
        let entries = (0..count)
            .map(|i| json!({ "login": format!("author{i}"), "contributions": (count - i) * 3 }))
            .collect();
        let _ = self.listings.insert(ResourceKind::Contributors, entries);
        self
    }

    fn entries(&self, kind: ResourceKind, state: StateFilter) -> Vec<&Value> {
        self.listings
            .get(&kind)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| state == StateFilter::All || e["state"] == "open")
                    .collect()
            })
            .unwrap_or_default()
    }

    fn wire(&self) -> Value {
        json!({
            "id": self.id,
            "full_name": self.full_name,
            "description": "A fake repository",
            "html_url": format!("https://github.com/{}", self.full_name),
            "default_branch": "main",
            "stargazers_count": 42,
            "forks_count": 7,
            "open_issues_count": self.open_issues_counter
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    Fail,
    RateLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchMode {
    Complete,
    Incomplete,
    Unavailable,
}

/// A fake upstream serving one repository.
#[derive(Debug)]
pub(crate) struct FakeApi {
    repo: Mutex<Option<FakeRepo>>,
    repository_fault: Option<Fault>,
    page_faults: HashMap<(ResourceKind, u32), Fault>,
    failing_kinds: HashSet<ResourceKind>,
    delays: HashMap<ResourceKind, Duration>,
    unlinked_kinds: HashSet<ResourceKind>,
    search: SearchMode,
    requests: Mutex<Vec<(ResourceKind, u32, StateFilter)>>,
}

impl FakeApi {
    pub(crate) fn new(repo: FakeRepo) -> Self {
        Self {
            repo: Mutex::new(Some(repo)),
            repository_fault: None,
            page_faults: HashMap::new(),
            failing_kinds: HashSet::new(),
            delays: HashMap::new(),
            unlinked_kinds: HashSet::new(),
            search: SearchMode::Unavailable,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// An upstream that knows no repository at all.
    pub(crate) fn empty() -> Self {
        let api = Self::new(FakeRepo::new("none/none"));
        *api.repo.lock().unwrap() = None;
        api
    }

    pub(crate) fn fail_page(mut self, kind: ResourceKind, page: u32) -> Self {
        let _ = self.page_faults.insert((kind, page), Fault::Fail);
        self
    }

    pub(crate) fn rate_limit_page(mut self, kind: ResourceKind, page: u32) -> Self {
        let _ = self.page_faults.insert((kind, page), Fault::RateLimit);
        self
    }

    pub(crate) fn fail_kind(mut self, kind: ResourceKind) -> Self {
        let _ = self.failing_kinds.insert(kind);
        self
    }

    pub(crate) fn fail_repository(mut self, fault: Fault) -> Self {
        self.repository_fault = Some(fault);
        self
    }

    pub(crate) fn delay(mut self, kind: ResourceKind, delay: Duration) -> Self {
        let _ = self.delays.insert(kind, delay);
        self
    }

    /// Serve `kind` without pagination links, as a proxy stripping the `Link` header would.
    pub(crate) fn without_links(mut self, kind: ResourceKind) -> Self {
        let _ = self.unlinked_kinds.insert(kind);
        self
    }

    pub(crate) fn search(mut self, mode: SearchMode) -> Self {
        self.search = mode;
        self
    }

    /// Replace the upstream contents, as if the repository changed between runs.
    pub(crate) fn set_repo(&self, repo: FakeRepo) {
        *self.repo.lock().unwrap() = Some(repo);
    }

    /// Pages requested for `kind`, in request order.
    pub(crate) fn requests_for(&self, kind: ResourceKind) -> Vec<u32> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, page, _)| *page)
            .collect()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn fault<T>(fault: Fault) -> HostingApiResult<T> {
        match fault {
            Fault::Fail => HostingApiResult::Failed(ohno::app_err!("injected failure"), None),
            Fault::RateLimit => HostingApiResult::RateLimited(RateLimitInfo {
                remaining: 0,
                reset_at: Utc::now() + TimeDelta::seconds(60),
            }),
        }
    }

    fn snapshot(&self) -> Option<FakeRepo> {
        self.repo.lock().unwrap().clone()
    }
}

impl HostingApi for FakeApi {
    async fn repository(&self, name: &RepoName) -> HostingApiResult<Repository> {
        if let Some(fault) = self.repository_fault {
            return Self::fault(fault);
        }

        let Some(repo) = self.snapshot().filter(|r| r.full_name == name.to_string()) else {
            return HostingApiResult::NotFound(None);
        };

        let wire: RepositoryWire = serde_json::from_value(repo.wire()).unwrap();
        HostingApiResult::Success(Repository::try_from(wire).unwrap(), None)
    }

    async fn list_page<R: Resource>(&self, name: &RepoName, request: PageRequest) -> HostingApiResult<RawResourcePage<R>> {
        self.requests.lock().unwrap().push((R::KIND, request.page, request.state));

        if let Some(delay) = self.delays.get(&R::KIND) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing_kinds.contains(&R::KIND) {
            return Self::fault(Fault::Fail);
        }

        if let Some(fault) = self.page_faults.get(&(R::KIND, request.page)) {
            return Self::fault(*fault);
        }

        let Some(repo) = self.snapshot().filter(|r| r.full_name == name.to_string()) else {
            return HostingApiResult::NotFound(None);
        };

        let entries = repo.entries(R::KIND, request.state);
        let per_page = usize::from(request.per_page);
        let last_page = entries.len().div_ceil(per_page).max(1) as u32;
        let start = (request.page as usize - 1) * per_page;

        let items: Vec<R> = entries
            .iter()
            .skip(start)
            .take(per_page)
            .map(|v| serde_json::from_value::<R::Wire>((*v).clone()).unwrap().into())
            .collect();

        // GitHub omits the `Link` header when a listing fits on one page.
        let linked = last_page > 1 && !self.unlinked_kinds.contains(&R::KIND);

        HostingApiResult::Success(
            RawResourcePage {
                raw_count: items.len(),
                items,
                has_next_page: linked && request.page < last_page,
                last_page_number: linked.then_some(last_page),
                links_present: linked,
            },
            None,
        )
    }

    async fn search_issue_count(&self, name: &RepoName, state: StateFilter) -> HostingApiResult<SearchCount> {
        if self.search == SearchMode::Unavailable || self.failing_kinds.contains(&ResourceKind::Issues) {
            return Self::fault(Fault::Fail);
        }

        let Some(repo) = self.snapshot().filter(|r| r.full_name == name.to_string()) else {
            return HostingApiResult::NotFound(None);
        };

        let total = repo
            .entries(ResourceKind::Issues, state)
            .iter()
            .filter(|e| e.get("pull_request").is_none())
            .count() as u64;

        HostingApiResult::Success(
            SearchCount {
                total,
                incomplete: self.search == SearchMode::Incomplete,
            },
            None,
        )
    }
}
