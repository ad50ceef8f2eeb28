//! Normalized items kept in an analysis.

use super::ResourceKind;
use crate::hosting::wire::{CommitWire, ContributorWire, IssueWire, PullRequestWire, ReleaseWire};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A listable upstream resource.
pub trait Resource: Sized + Send + Sync + 'static {
    const KIND: ResourceKind;

    /// Upstream JSON shape of one listing entry.
    type Wire: DeserializeOwned + Send + Into<Self>;

    /// Whether the item counts towards the resource's totals.
    ///
    /// Items that the upstream lists under this resource but that belong to a
    /// different one (pull requests in the issues listing) return `false`.
    fn is_counted(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,

    /// First line of the commit message.
    pub summary: String,
    pub author_name: Option<String>,
    pub author_login: Option<String>,
    pub authored_at: Option<DateTime<Utc>>,
}

impl Commit {
    /// The most stable identity available for the author.
    #[must_use]
    pub fn author_key(&self) -> Option<&str> {
        self.author_login.as_deref().or(self.author_name.as_deref())
    }
}

impl From<CommitWire> for Commit {
    fn from(wire: CommitWire) -> Self {
        let (author_name, authored_at) = wire.commit.author.map_or((None, None), |sig| (sig.name, sig.date));

        Self {
            summary: wire.commit.message.lines().next().unwrap_or_default().to_string(),
            sha: wire.sha,
            author_name,
            author_login: wire.author.map(|u| u.login),
            authored_at,
        }
    }
}

impl Resource for Commit {
    const KIND: ResourceKind = ResourceKind::Commits;
    type Wire = CommitWire;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: ItemState,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub comments: u64,
    pub labels: Vec<String>,

    /// The upstream issues listing also returns pull requests.
    #[serde(default, skip_serializing_if = "core::ops::Not::not")]
    pub is_pull_request: bool,
}

impl Issue {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, ItemState::Open)
    }
}

impl From<IssueWire> for Issue {
    fn from(wire: IssueWire) -> Self {
        Self {
            number: wire.number,
            title: wire.title,
            state: wire.state,
            author: wire.user.map(|u| u.login),
            created_at: wire.created_at,
            closed_at: wire.closed_at,
            comments: wire.comments,
            labels: wire.labels.into_iter().map(|l| l.name).collect(),
            is_pull_request: wire.pull_request.is_some(),
        }
    }
}

impl Resource for Issue {
    const KIND: ResourceKind = ResourceKind::Issues;
    type Wire = IssueWire;

    fn is_counted(&self) -> bool {
        !self.is_pull_request
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: ItemState,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub draft: bool,
}

impl PullRequest {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, ItemState::Open)
    }

    #[must_use]
    pub const fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

impl From<PullRequestWire> for PullRequest {
    fn from(wire: PullRequestWire) -> Self {
        Self {
            number: wire.number,
            title: wire.title,
            state: wire.state,
            author: wire.user.map(|u| u.login),
            created_at: wire.created_at,
            closed_at: wire.closed_at,
            merged_at: wire.merged_at,
            draft: wire.draft,
        }
    }
}

impl Resource for PullRequest {
    const KIND: ResourceKind = ResourceKind::PullRequests;
    type Wire = PullRequestWire;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag: String,
    pub name: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub prerelease: bool,
    pub draft: bool,
}

impl From<ReleaseWire> for Release {
    fn from(wire: ReleaseWire) -> Self {
        Self {
            tag: wire.tag_name,
            name: wire.name.filter(|n| !n.is_empty()),
            author: wire.author.map(|u| u.login),
            published_at: wire.published_at,
            prerelease: wire.prerelease,
            draft: wire.draft,
        }
    }
}

impl Resource for Release {
    const KIND: ResourceKind = ResourceKind::Releases;
    type Wire = ReleaseWire;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: Option<String>,
    pub name: Option<String>,
    pub contributions: u64,
}

impl Contributor {
    /// Login for accounts, recorded name for anonymous contributors.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.login.as_deref().or(self.name.as_deref()).unwrap_or("anonymous")
    }
}

impl From<ContributorWire> for Contributor {
    fn from(wire: ContributorWire) -> Self {
        Self {
            login: wire.login,
            name: wire.name,
            contributions: wire.contributions,
        }
    }
}

impl Resource for Contributor {
    const KIND: ResourceKind = ResourceKind::Contributors;
    type Wire = ContributorWire;
}
