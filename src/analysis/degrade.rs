//! The one place where upstream failures are turned into degraded data.

use super::{LOG_TARGET, RepoName};
use crate::hosting::HostingApiResult;
use core::fmt::Display;
use core::time::Duration;

/// Unwrap a successful upstream result, or log why there is nothing to use.
pub fn accept<T>(result: HostingApiResult<T>, repo: &RepoName, what: impl Display) -> Option<T> {
    match result {
        HostingApiResult::Success(data, _) => Some(data),
        HostingApiResult::RateLimited(rate_limit) => {
            log::warn!(
                target: LOG_TARGET,
                "Rate limited while fetching {what} for '{repo}' (resets at {})",
                rate_limit.reset_at.format("%T")
            );
            None
        }
        HostingApiResult::NotFound(_) => {
            log::warn!(target: LOG_TARGET, "Upstream returned not found for {what} of '{repo}'");
            None
        }
        HostingApiResult::Failed(e, _) => {
            log::warn!(target: LOG_TARGET, "Could not fetch {what} for '{repo}': {e:#}");
            None
        }
    }
}

/// Run `task`, substituting `degraded()` if it outlives `deadline`.
pub async fn within_deadline<T>(
    deadline: Duration,
    repo: &RepoName,
    what: impl Display,
    task: impl Future<Output = T>,
    degraded: impl FnOnce() -> T,
) -> T {
    if let Ok(value) = tokio::time::timeout(deadline, task).await {
        value
    } else {
        log::warn!(
            target: LOG_TARGET,
            "Gave up on {what} for '{repo}' after {deadline:?}"
        );
        degraded()
    }
}
