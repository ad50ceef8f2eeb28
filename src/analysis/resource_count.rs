use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// The upstream resource listings the pipeline collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    Commits,
    PullRequests,
    Issues,
    Releases,
    Contributors,
}

impl ResourceKind {
    /// Path segment of the listing under `/repos/{owner}/{name}/`.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Commits => "commits",
            Self::PullRequests => "pulls",
            Self::Issues => "issues",
            Self::Releases => "releases",
            Self::Contributors => "contributors",
        }
    }

    /// Items requested per page.
    #[must_use]
    pub const fn page_size(self) -> u8 {
        match self {
            Self::Releases => 50,
            _ => 100,
        }
    }

    /// Maximum number of items retained per repository.
    #[must_use]
    pub const fn retained_cap(self) -> usize {
        match self {
            Self::Commits | Self::PullRequests => 300,
            Self::Issues | Self::Contributors => 500,
            Self::Releases => 50,
        }
    }

    /// Whether the listing accepts a `state` filter.
    #[must_use]
    pub const fn has_state(self) -> bool {
        matches!(self, Self::Issues | Self::PullRequests)
    }
}

/// How much a [`ResourceCount`] can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CountBasis {
    /// Every item was enumerated, or the upstream provided an authoritative total.
    Exact,

    /// Extrapolated from partial pagination.
    Estimated,

    /// Enumeration stopped early (budget or failure); the value is a lower bound.
    Capped,
}

impl CountBasis {
    const fn rank(self) -> u8 {
        match self {
            Self::Exact => 2,
            Self::Estimated => 1,
            Self::Capped => 0,
        }
    }

    /// The less precise of two bases.
    #[must_use]
    pub const fn weakest(self, other: Self) -> Self {
        if self.rank() <= other.rank() { self } else { other }
    }
}

/// A derived total for one resource, tagged with its precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCount {
    pub resource: ResourceKind,
    pub value: u64,
    pub basis: CountBasis,
}

impl ResourceCount {
    #[must_use]
    pub const fn exact(resource: ResourceKind, value: u64) -> Self {
        Self {
            resource,
            value,
            basis: CountBasis::Exact,
        }
    }

    #[must_use]
    pub const fn estimated(resource: ResourceKind, value: u64) -> Self {
        Self {
            resource,
            value,
            basis: CountBasis::Estimated,
        }
    }

    #[must_use]
    pub const fn capped(resource: ResourceKind, value: u64) -> Self {
        Self {
            resource,
            value,
            basis: CountBasis::Capped,
        }
    }

    /// The result of a count whose upstream requests failed.
    #[must_use]
    pub const fn degraded(resource: ResourceKind) -> Self {
        Self::capped(resource, 0)
    }

    #[must_use]
    pub const fn is_exact(&self) -> bool {
        matches!(self.basis, CountBasis::Exact)
    }

    /// Raise the value to `floor` when it is lower, keeping the basis.
    #[must_use]
    pub fn at_least(self, floor: u64) -> Self {
        Self {
            value: self.value.max(floor),
            ..self
        }
    }
}

/// The full set of counts kept for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSet {
    pub total_commits: ResourceCount,
    pub total_contributors: ResourceCount,
    pub total_issues: ResourceCount,
    pub total_pull_requests: ResourceCount,
    pub total_releases: ResourceCount,
    pub open_issues: ResourceCount,
}

impl CountSet {
    /// All counts zero and `CAPPED`.
    #[must_use]
    pub const fn degraded() -> Self {
        Self {
            total_commits: ResourceCount::degraded(ResourceKind::Commits),
            total_contributors: ResourceCount::degraded(ResourceKind::Contributors),
            total_issues: ResourceCount::degraded(ResourceKind::Issues),
            total_pull_requests: ResourceCount::degraded(ResourceKind::PullRequests),
            total_releases: ResourceCount::degraded(ResourceKind::Releases),
            open_issues: ResourceCount::degraded(ResourceKind::Issues),
        }
    }

    /// Restore `open_issues <= total_issues`.
    ///
    /// An exact total wins and the open count is clamped to it, losing its exactness.
    /// Otherwise the total is raised to the open count and becomes a lower bound.
    #[must_use]
    pub fn with_issue_bound(mut self) -> Self {
        if self.open_issues.value <= self.total_issues.value {
            return self;
        }

        if self.total_issues.is_exact() {
            self.open_issues = ResourceCount {
                value: self.total_issues.value,
                basis: self.open_issues.basis.weakest(CountBasis::Estimated),
                ..self.open_issues
            };
        } else {
            self.total_issues = ResourceCount::capped(ResourceKind::Issues, self.open_issues.value);
        }

        self
    }
}
