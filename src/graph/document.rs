use crate::analysis::AggregateAnalysis;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum NodeLabel {
    Repository,
    Contributor,
    Commit,
    PullRequest,
    Issue,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    ContributedTo,
    Authored,
    Opened,
    Published,
    BelongsTo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub key: String,
    pub label: NodeLabel,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

impl Node {
    #[must_use]
    pub fn new(label: NodeLabel, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label,
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        let _ = self.properties.insert(name.to_string(), value.into());
        self
    }

    fn with_time(self, name: &str, value: Option<DateTime<Utc>>) -> Self {
        match value {
            Some(at) => self.with_property(name, at.to_rfc3339()),
            None => self,
        }
    }

    fn time(&self, name: &str) -> Option<DateTime<Utc>> {
        let raw = self.properties.get(name)?.as_str()?;
        DateTime::parse_from_rfc3339(raw).ok().map(|at| at.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

impl Relationship {
    fn new(kind: RelationshipKind, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            kind,
            from: from.into(),
            to: to.into(),
            properties: BTreeMap::new(),
        }
    }

    fn with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        let _ = self.properties.insert(name.to_string(), value.into());
        self
    }
}

/// The graph projection of one repository's analysis.
///
/// Every node and relationship belongs to the namespace of the repository, which is its
/// `owner/name`. Mirrors replace a namespace wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub namespace: String,
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
}

impl GraphDocument {
    #[must_use]
    pub fn project(analysis: &AggregateAnalysis) -> Self {
        let mut builder = Builder::default();
        let repo_key = format!("repo:{}", analysis.repository.full_name);

        builder.node(
            Node::new(NodeLabel::Repository, &repo_key)
                .with_property("id", analysis.repository.id)
                .with_property("full_name", analysis.repository.full_name.to_string())
                .with_property("total_commits", analysis.counts.total_commits.value)
                .with_property("total_issues", analysis.counts.total_issues.value)
                .with_property("open_issues", analysis.counts.open_issues.value),
        );

        for contributor in &analysis.contributors {
            let person = builder.person(contributor.display_name());
            builder.relate(
                Relationship::new(RelationshipKind::ContributedTo, person, &repo_key)
                    .with_property("contributions", contributor.contributions),
            );
        }

        for commit in &analysis.commits {
            let key = format!("commit:{}", commit.sha);
            builder.node(
                Node::new(NodeLabel::Commit, &key)
                    .with_property("summary", commit.summary.as_str())
                    .with_time("authored_at", commit.authored_at),
            );
            builder.relate(Relationship::new(RelationshipKind::BelongsTo, &key, &repo_key));
            if let Some(author) = commit.author_key() {
                let person = builder.person(author);
                builder.relate(Relationship::new(RelationshipKind::Authored, person, &key));
            }
        }

        for pr in &analysis.pull_requests {
            let key = format!("pr:{}", pr.number);
            builder.node(
                Node::new(NodeLabel::PullRequest, &key)
                    .with_property("number", pr.number)
                    .with_property("title", pr.title.as_str())
                    .with_property("open", pr.is_open())
                    .with_property("merged", pr.is_merged())
                    .with_time("created_at", Some(pr.created_at)),
            );
            builder.relate(Relationship::new(RelationshipKind::BelongsTo, &key, &repo_key));
            if let Some(author) = &pr.author {
                let person = builder.person(author);
                builder.relate(Relationship::new(RelationshipKind::Opened, person, &key));
            }
        }

        for issue in &analysis.issues {
            let key = format!("issue:{}", issue.number);
            builder.node(
                Node::new(NodeLabel::Issue, &key)
                    .with_property("number", issue.number)
                    .with_property("title", issue.title.as_str())
                    .with_property("open", issue.is_open())
                    .with_property("comments", issue.comments)
                    .with_time("created_at", Some(issue.created_at)),
            );
            builder.relate(Relationship::new(RelationshipKind::BelongsTo, &key, &repo_key));
            if let Some(author) = &issue.author {
                let person = builder.person(author);
                builder.relate(Relationship::new(RelationshipKind::Opened, person, &key));
            }
        }

        for release in &analysis.releases {
            let key = format!("release:{}", release.tag);
            builder.node(
                Node::new(NodeLabel::Release, &key)
                    .with_property("tag", release.tag.as_str())
                    .with_property("prerelease", release.prerelease)
                    .with_time("published_at", release.published_at),
            );
            builder.relate(Relationship::new(RelationshipKind::BelongsTo, &key, &repo_key));
            if let Some(author) = &release.author {
                let person = builder.person(author);
                builder.relate(Relationship::new(RelationshipKind::Published, person, &key));
            }
        }

        Self {
            namespace: analysis.repository.full_name.to_string(),
            nodes: builder.nodes,
            relationships: builder.relationships,
        }
    }

    #[must_use]
    pub fn nodes_with_label(&self, label: NodeLabel) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.label == label)
    }

    /// Contributors ranked by recorded contributions, highest first.
    #[must_use]
    pub fn top_contributors(&self, limit: usize) -> Vec<(String, u64)> {
        let mut ranked: Vec<_> = self
            .relationships
            .iter()
            .filter(|r| r.kind == RelationshipKind::ContributedTo)
            .map(|r| {
                let contributions = r.properties.get("contributions").and_then(Value::as_u64).unwrap_or(0);
                (r.from.trim_start_matches("user:").to_string(), contributions)
            })
            .collect();

        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// Number of mirrored commits per authored day, oldest first.
    #[must_use]
    pub fn commit_timeline(&self) -> Vec<(NaiveDate, u64)> {
        let mut days = BTreeMap::new();
        for at in self.nodes_with_label(NodeLabel::Commit).filter_map(|n| n.time("authored_at")) {
            *days.entry(at.date_naive()).or_insert(0) += 1;
        }

        days.into_iter().collect()
    }
}

#[derive(Debug, Default)]
struct Builder {
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
    index: HashMap<String, usize>,
}

impl Builder {
    /// Add a node; a later node with the same key is merged into the first.
    fn node(&mut self, node: Node) {
        if let Some(&existing) = self.index.get(&node.key) {
            self.nodes[existing].properties.extend(node.properties);
            return;
        }

        let _ = self.index.insert(node.key.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    fn person(&mut self, name: &str) -> String {
        let key = format!("user:{name}");
        self.node(Node::new(NodeLabel::Contributor, &key).with_property("name", name));
        key
    }

    fn relate(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }
}
