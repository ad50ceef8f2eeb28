use crate::Result;
use core::fmt::{Display, Formatter};
use ohno::{IntoAppError, bail};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// A repository's `owner/name`.
///
/// Used as the upstream lookup key and as the graph namespace. Accepts either the bare
/// `owner/name` form or a repository URL, from which only the first two path segments
/// are kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName {
    owner: Arc<str>,
    name: Arc<str>,
}

impl RepoName {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if input.contains("://") {
            let url = Url::parse(input).into_app_err_with(|| format!("invalid repository URL '{input}'"))?;
            return Self::from_url(&url);
        }

        let Some((owner, name)) = input.split_once('/') else {
            bail!("invalid repository name '{input}': expected 'owner/name'");
        };

        Self::from_parts(owner, name.trim_end_matches(".git"))
            .map_err(|e| ohno::app_err!("invalid repository name '{input}': {e}"))
    }

    fn from_url(url: &Url) -> Result<Self> {
        let path_segments: Vec<_> = url.path_segments().map(Iterator::collect).unwrap_or_default();

        if path_segments.len() < 2 {
            bail!("invalid repository URL format: {url}");
        }

        Self::from_parts(path_segments[0], path_segments[1].trim_end_matches(".git"))
            .map_err(|e| ohno::app_err!("invalid repository URL '{url}': {e}"))
    }

    fn from_parts(owner: &str, name: &str) -> Result<Self> {
        validate_segment(owner, "owner")?;
        validate_segment(name, "repository name")?;

        Ok(Self {
            owner: Arc::from(owner),
            name: Arc::from(name),
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

fn validate_segment(segment: &str, what: &str) -> Result<()> {
    if segment.is_empty() {
        bail!("empty {what}");
    }

    if segment == "." || segment == ".." {
        bail!("{what} '{segment}' is not allowed");
    }

    if let Some(c) = segment.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))) {
        bail!("{what} '{segment}' contains invalid character '{c}'");
    }

    Ok(())
}

impl Display for RepoName {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl TryFrom<String> for RepoName {
    type Error = ohno::AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RepoName> for String {
    fn from(value: RepoName) -> Self {
        value.to_string()
    }
}
