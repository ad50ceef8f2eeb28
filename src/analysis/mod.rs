//! Repository data aggregation and count estimation
//!
//! This module turns the paginated, rate-limited upstream listings into one
//! [`AggregateAnalysis`] per repository.
//!
//! # Implementation Model
//!
//! - The [`Collector`] walks one resource listing page by page, strictly in order, until
//!   a short page, the page budget, or a failure ends it. The terminal
//!   [`PaginationOutcome`] records which of those happened.
//! - The [`Estimator`] derives a total for each countable resource using the cheapest
//!   technique that is still honest about its precision: an authoritative upstream
//!   counter, the last-page technique, or extrapolation. Every result is a
//!   [`ResourceCount`] tagged `EXACT`, `ESTIMATED`, or `CAPPED`.
//! - The [`Aggregator`] runs the five collections and the count estimations
//!   concurrently, waits for all of them, reconciles counts with what was actually
//!   collected, and computes derived metrics from the collected data alone.
//!
//! Upstream failures never escape this module as errors. They are funnelled through
//! one degrade helper that logs them and produces a truncated sequence or a zero
//! `CAPPED` count instead.

mod aggregate;
mod aggregator;
mod collector;
mod degrade;
mod estimator;
mod items;
mod page;
mod repo_name;
mod resource_count;
mod settings;

pub use aggregate::{AggregateAnalysis, DerivedMetrics, Repository, RepositoryIdentity};
pub use aggregator::Aggregator;
pub use collector::{CollectPlan, Collected, Collector, PaginationOutcome};
pub use estimator::Estimator;
pub use items::{Commit, Contributor, Issue, ItemState, PullRequest, Release, Resource};
pub use page::{PageRequest, RawResourcePage, StateFilter};
pub use repo_name::RepoName;
pub use resource_count::{CountBasis, CountSet, ResourceCount, ResourceKind};
pub use settings::AnalysisSettings;

const LOG_TARGET: &str = "  analysis";
