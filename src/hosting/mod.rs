//! Access to the upstream repository hosting service.
//!
//! [`Client`] performs raw HTTP requests and classifies the responses into a
//! [`HostingApiResult`]. [`GitHubApi`] builds on it to implement [`HostingApi`], the
//! read-only boundary the analysis pipeline consumes. Tests substitute their own
//! [`HostingApi`] implementation.

mod api;
mod client;
#[cfg(test)]
pub(crate) mod fake;
mod throttler;
pub mod wire;

pub use api::{GitHubApi, HostingApi, SearchCount};
pub use client::{Client, HostingApiResult, PageLinks, RateLimitInfo};
pub use throttler::Throttler;
