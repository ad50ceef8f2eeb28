use super::wire::{RepositoryWire, SearchWire};
use super::{Client, HostingApiResult, PageLinks, RateLimitInfo, Throttler};
use crate::analysis::{PageRequest, RawResourcePage, RepoName, Repository, Resource, ResourceKind, StateFilter};
use chrono::Utc;
use core::time::Duration;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

const LOG_TARGET: &str = "   hosting";

/// Macro to handle `HostingApiResult` early returns for non-Success cases
macro_rules! unwrap_or_return {
    ($result:expr) => {
        match $result {
            HostingApiResult::Success(data, rate_limit) => (data, rate_limit),
            HostingApiResult::RateLimited(rate_limit) => return HostingApiResult::RateLimited(rate_limit),
            HostingApiResult::NotFound(rate_limit) => return HostingApiResult::NotFound(rate_limit),
            HostingApiResult::Failed(e, rate_limit) => return HostingApiResult::Failed(e, rate_limit),
        }
    };
}

/// Total matched by an issue search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchCount {
    pub total: u64,

    /// The upstream timed out part of the search and the total may be short.
    pub incomplete: bool,
}

/// Read-only access to one hosting service.
///
/// Every operation reports its outcome as a [`HostingApiResult`] rather than an error, so
/// callers decide how each failure degrades.
pub trait HostingApi: Send + Sync {
    /// Resolve a repository's identity and metadata.
    fn repository(&self, name: &RepoName) -> impl Future<Output = HostingApiResult<Repository>> + Send;

    /// Fetch one page of a resource listing.
    fn list_page<R: Resource>(
        &self,
        name: &RepoName,
        request: PageRequest,
    ) -> impl Future<Output = HostingApiResult<RawResourcePage<R>>> + Send;

    /// Count issues, excluding pull requests, through the search endpoint.
    fn search_issue_count(&self, name: &RepoName, state: StateFilter) -> impl Future<Output = HostingApiResult<SearchCount>> + Send;
}

/// [`HostingApi`] over the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubApi {
    client: Client,
    throttler: Arc<Throttler>,
    max_rate_limit_pause: Duration,
}

impl GitHubApi {
    #[must_use]
    pub fn new(client: Client, max_concurrent_requests: usize, max_rate_limit_pause: Duration) -> Self {
        Self {
            client,
            throttler: Throttler::new(max_concurrent_requests),
            max_rate_limit_pause,
        }
    }

    /// Issue one GET through the throttler, pausing every later request on a rate limit.
    async fn send(&self, url: &str) -> HostingApiResult<(reqwest::Response, PageLinks)> {
        if let Some(remaining) = self.throttler.remaining_pause() {
            log::debug!(target: LOG_TARGET, "Skipping request to {url} while rate limited");
            return HostingApiResult::RateLimited(RateLimitInfo {
                remaining: 0,
                reset_at: Utc::now() + remaining,
            });
        }

        let result = {
            let _permit = self.throttler.acquire().await;
            self.client.api_call(url).await
        };

        if let HostingApiResult::RateLimited(rate_limit) = result {
            self.pause_until(rate_limit);
        }

        result
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> HostingApiResult<(T, PageLinks)> {
        let ((resp, links), rate_limit) = unwrap_or_return!(self.send(url).await);
        if has_no_entries(&resp) {
            return HostingApiResult::Failed(ohno::app_err!("no content from {url} (HTTP {})", resp.status()), rate_limit);
        }

        decode(resp, url, links, rate_limit).await
    }

    /// Like [`Self::get_json`], except that a response without entries is an empty listing.
    async fn get_listing<W: DeserializeOwned>(&self, url: &str) -> HostingApiResult<(Vec<W>, PageLinks)> {
        let ((resp, links), rate_limit) = unwrap_or_return!(self.send(url).await);
        if has_no_entries(&resp) {
            log::debug!(target: LOG_TARGET, "{url} answered HTTP {} without entries, treating the listing as empty", resp.status());
            return HostingApiResult::Success((Vec::new(), PageLinks::default()), rate_limit);
        }

        decode(resp, url, links, rate_limit).await
    }

    fn pause_until(&self, rate_limit: RateLimitInfo) {
        let wait = (rate_limit.reset_at - Utc::now()).to_std().unwrap_or_default();
        let wait = wait.min(self.max_rate_limit_pause);

        if self.throttler.pause_for(wait) {
            log::warn!(
                target: LOG_TARGET,
                "Hit the GitHub rate limit, pausing requests until {}",
                (Utc::now() + wait).format("%T")
            );
        }
    }

    fn repo_url(&self, name: &RepoName) -> String {
        format!("{}/repos/{}/{}", self.client.base_url(), name.owner(), name.name())
    }

    fn list_url<R: Resource>(&self, name: &RepoName, request: PageRequest) -> String {
        let mut url = format!(
            "{}/{}?per_page={}&page={}",
            self.repo_url(name),
            R::KIND.path(),
            request.per_page,
            request.page
        );

        if R::KIND.has_state() {
            url.push_str("&state=");
            url.push_str(request.state.as_query());
        }

        // Anonymous contributors are only listed on request.
        if R::KIND == ResourceKind::Contributors {
            url.push_str("&anon=1");
        }

        url
    }

    fn search_url(&self, name: &RepoName, state: StateFilter) -> crate::Result<Url> {
        let mut query = format!("repo:{name} is:issue");
        if state == StateFilter::Open {
            query.push_str(" is:open");
        }

        Ok(Url::parse_with_params(
            &format!("{}/search/issues", self.client.base_url()),
            &[("q", query.as_str()), ("per_page", "1")],
        )?)
    }
}

impl HostingApi for GitHubApi {
    async fn repository(&self, name: &RepoName) -> HostingApiResult<Repository> {
        log::debug!(target: LOG_TARGET, "Resolving repository '{name}'");

        let ((wire, _), rate_limit) = unwrap_or_return!(self.get_json::<RepositoryWire>(&self.repo_url(name)).await);
        match Repository::try_from(wire) {
            Ok(repo) => HostingApiResult::Success(repo, rate_limit),
            Err(e) => HostingApiResult::Failed(e, rate_limit),
        }
    }

    async fn list_page<R: Resource>(&self, name: &RepoName, request: PageRequest) -> HostingApiResult<RawResourcePage<R>> {
        let url = self.list_url::<R>(name, request);
        log::debug!(target: LOG_TARGET, "Fetching {url}");

        self.get_listing::<R::Wire>(&url).await.map(|(entries, links)| RawResourcePage {
            raw_count: entries.len(),
            items: entries.into_iter().map(Into::into).collect(),
            has_next_page: links.has_next,
            last_page_number: links.last_page,
            links_present: links.present,
        })
    }

    async fn search_issue_count(&self, name: &RepoName, state: StateFilter) -> HostingApiResult<SearchCount> {
        let url = match self.search_url(name, state) {
            Ok(url) => url,
            Err(e) => return HostingApiResult::Failed(e, None),
        };

        self.get_json::<SearchWire>(url.as_str()).await.map(|(search, _)| SearchCount {
            total: search.total_count,
            incomplete: search.incomplete_results,
        })
    }
}

/// 204 No Content, 409 Conflict (an empty repository), or a zero-length body.
fn has_no_entries(resp: &reqwest::Response) -> bool {
    matches!(resp.status(), StatusCode::NO_CONTENT | StatusCode::CONFLICT) || resp.content_length() == Some(0)
}

async fn decode<T: DeserializeOwned>(
    resp: reqwest::Response,
    url: &str,
    links: PageLinks,
    rate_limit: Option<RateLimitInfo>,
) -> HostingApiResult<(T, PageLinks)> {
    match resp.json::<T>().await {
        Ok(data) => HostingApiResult::Success((data, links), rate_limit),
        Err(e) => HostingApiResult::Failed(ohno::app_err!("could not decode response from {url}: {e}"), rate_limit),
    }
}
