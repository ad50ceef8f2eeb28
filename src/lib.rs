//! repo-pulse crate
//!
//! Collects commits, pull requests, issues, releases, and contributors for a hosted
//! repository and turns the upstream API's inconsistent totals into stable aggregate
//! metrics. Every count carries a [`CountBasis`](analysis::CountBasis) so callers can
//! tell an authoritative total from an extrapolated or truncated one.
//!
//! # Module Organization
//!
//! - [`hosting`]: HTTP client and the [`HostingApi`](hosting::HostingApi) boundary
//! - [`analysis`]: collector, count estimator, and aggregator
//! - [`store`]: persistence of aggregate documents
//! - [`graph`]: optional node/relationship mirror of an aggregate document
//! - [`service`]: the select/get operations consumed by outer layers
//! - [`commands`]: command-line front end

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod analysis;

#[doc(hidden)]
pub mod commands;

pub mod graph;
pub mod hosting;
pub mod service;
pub mod store;

pub use commands::{Host, run};
