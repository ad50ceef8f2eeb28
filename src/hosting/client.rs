//! GitHub API client
//!
//! Minimal HTTP client for the hosting API. It knows nothing about individual
//! resources; it issues GET requests, reads rate-limit and pagination headers, and
//! classifies every response into a [`HostingApiResult`].

use chrono::{DateTime, Utc};
use core::time::Duration;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, LINK, RETRY_AFTER};
use url::Url;

/// Wait assumed when the upstream reports a rate limit without saying when it resets.
const DEFAULT_RATE_LIMIT_WAIT_SECS: i64 = 60;

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Result of a hosting API call
#[derive(Debug)]
pub enum HostingApiResult<T> {
    /// Request succeeded - contains data and optional rate limit info
    Success(T, Option<RateLimitInfo>),

    /// Rate limited - the upstream refuses further calls until the reset time
    RateLimited(RateLimitInfo),

    /// The requested resource was not found (404)
    NotFound(Option<RateLimitInfo>),

    /// Request failed (network error, timeout, 5xx, undecodable body)
    Failed(ohno::AppError, Option<RateLimitInfo>),
}

impl<T> HostingApiResult<T> {
    /// Transform the success payload, keeping every other outcome as-is.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> HostingApiResult<U> {
        match self {
            Self::Success(data, rate_limit) => HostingApiResult::Success(f(data), rate_limit),
            Self::RateLimited(rate_limit) => HostingApiResult::RateLimited(rate_limit),
            Self::NotFound(rate_limit) => HostingApiResult::NotFound(rate_limit),
            Self::Failed(e, rate_limit) => HostingApiResult::Failed(e, rate_limit),
        }
    }

    /// Rate limit information attached to this outcome, if any.
    #[must_use]
    pub const fn rate_limit(&self) -> Option<RateLimitInfo> {
        match self {
            Self::Success(_, rate_limit) | Self::NotFound(rate_limit) | Self::Failed(_, rate_limit) => *rate_limit,
            Self::RateLimited(rate_limit) => Some(*rate_limit),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(..))
    }
}

/// Pagination signals carried by a `Link` response header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// A `rel="next"` link is present.
    pub has_next: bool,

    /// Page number of the `rel="last"` link, when present.
    pub last_page: Option<u32>,

    /// The response carried any pagination link at all.
    pub present: bool,
}

impl PageLinks {
    /// Parse a `Link` header such as
    /// `<https://api.github.com/repositories/1/commits?page=2>; rel="next", <...?page=7>; rel="last"`.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let mut links = Self::default();

        for entry in header.split(',') {
            let mut parts = entry.split(';');
            let Some(target) = parts.next().map(str::trim) else {
                continue;
            };
            let target = target.trim_start_matches('<').trim_end_matches('>');

            for param in parts {
                let Some(rel) = param.trim().strip_prefix("rel=") else {
                    continue;
                };

                match rel.trim_matches('"') {
                    "next" => links.has_next = true,
                    "last" => links.last_page = page_number(target),
                    "prev" | "first" => {}
                    _ => continue,
                }
                links.present = true;
            }
        }

        links
    }

    fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(LINK)
            .and_then(|h| h.to_str().ok())
            .map(Self::parse)
            .unwrap_or_default()
    }
}

fn page_number(target: &str) -> Option<u32> {
    let url = Url::parse(target).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

/// Hosting API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a new hosting API client with optional authentication token and base URL
    pub fn new(token: Option<&str>, base_url: impl Into<String>, request_timeout: Duration) -> crate::Result<Self> {
        use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};

        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("token {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder()
            .user_agent("repo-pulse")
            .default_headers(headers)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make an API call and classify the result
    ///
    /// On success the response is returned together with the pagination links found in
    /// its headers, so callers can decode the body without losing them.
    pub async fn api_call(&self, url: &str) -> HostingApiResult<(reqwest::Response, PageLinks)> {
        let resp = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return HostingApiResult::Failed(e.into(), None),
        };

        // Extract rate limit info from response headers before checking status
        let rate_limit = extract_rate_limit_from_headers(resp.headers());

        // GitHub answers listings of an empty repository with 409 Conflict; callers
        // decide what an empty answer means for the endpoint they called.
        let status = resp.status();
        if status.is_success() || status == StatusCode::CONFLICT {
            let links = PageLinks::from_headers(resp.headers());
            return HostingApiResult::Success((resp, links), rate_limit);
        }

        if is_rate_limited(status, resp.headers(), rate_limit) {
            let retry_after = parse_retry_after(resp.headers());
            let rate_limit = match (rate_limit, retry_after) {
                (_, Some(secs)) => RateLimitInfo {
                    remaining: 0,
                    reset_at: Utc::now() + chrono::Duration::seconds(secs),
                },
                (Some(info), None) => info,
                (None, None) => RateLimitInfo {
                    remaining: 0,
                    reset_at: Utc::now() + chrono::Duration::seconds(DEFAULT_RATE_LIMIT_WAIT_SECS),
                },
            };
            return HostingApiResult::RateLimited(rate_limit);
        }

        if status == StatusCode::NOT_FOUND {
            return HostingApiResult::NotFound(rate_limit);
        }

        match resp.error_for_status() {
            Err(e) => HostingApiResult::Failed(e.into(), rate_limit),
            Ok(_) => HostingApiResult::Failed(ohno::app_err!("unexpected HTTP status {status} for {url}"), rate_limit),
        }
    }
}

/// 429 is always a rate limit; 403 only when the quota is exhausted or the
/// upstream asks us to back off (secondary rate limit).
fn is_rate_limited(status: StatusCode, headers: &HeaderMap, rate_limit: Option<RateLimitInfo>) -> bool {
    match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => rate_limit.is_some_and(|rl| rl.remaining == 0) || headers.contains_key(RETRY_AFTER),
        _ => false,
    }
}

/// Parse the `Retry-After` header value as seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<i64> {
    headers.get(RETRY_AFTER)?.to_str().ok()?.parse::<i64>().ok()
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}
