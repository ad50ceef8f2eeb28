//! Upstream JSON shapes.
//!
//! Only the fields the pipeline uses are declared; everything else in the upstream
//! payloads is ignored. These types are converted into the normalized items in
//! [`crate::analysis`] as soon as a page is decoded.

use crate::analysis::ItemState;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryWire {
    pub id: u64,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    /// Includes open pull requests on GitHub.
    #[serde(default)]
    pub open_issues_count: Option<u64>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserWire {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitWire {
    pub sha: String,
    pub commit: CommitDetailWire,
    /// The linked account; absent when the commit email maps to no user.
    #[serde(default)]
    pub author: Option<UserWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetailWire {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<SignatureWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignatureWire {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// An entry of the issues listing, which also contains pull requests.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueWire {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub state: ItemState,
    #[serde(default)]
    pub user: Option<UserWire>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub labels: Vec<LabelWire>,
    pub pull_request: Option<PullRequestMarker>,
}

/// Marker type to detect if an issue is actually a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestMarker {
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelWire {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestWire {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub state: ItemState,
    #[serde(default)]
    pub user: Option<UserWire>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseWire {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub author: Option<UserWire>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContributorWire {
    /// Anonymous contributors have no login.
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contributions: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchWire {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
}
