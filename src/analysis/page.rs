use super::Resource;
use serde::{Deserialize, Serialize};

/// Listing `state` filter for resources that support one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    #[default]
    All,
    Open,
}

impl StateFilter {
    #[must_use]
    pub const fn as_query(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Open => "open",
        }
    }
}

/// One page request against a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    pub per_page: u8,
    pub state: StateFilter,
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: u32, per_page: u8, state: StateFilter) -> Self {
        Self { page, per_page, state }
    }
}

/// One decoded page of a listing.
#[derive(Debug, Clone)]
pub struct RawResourcePage<R> {
    pub items: Vec<R>,

    /// The upstream advertised a next page.
    pub has_next_page: bool,

    /// Number of the last page, when the upstream advertised it.
    pub last_page_number: Option<u32>,

    /// The upstream sent pagination links with this page. Without them a missing next
    /// link says nothing about whether the listing continues.
    pub links_present: bool,

    /// Entries on the page before any filtering.
    pub raw_count: usize,
}

impl<R: Resource> RawResourcePage<R> {
    /// Whether this page ends the listing.
    ///
    /// A short page always does. A full page only does when the upstream sent
    /// pagination links and none of them points to a next page.
    #[must_use]
    pub fn is_final(&self, per_page: u8) -> bool {
        self.raw_count < usize::from(per_page) || (self.links_present && !self.has_next_page)
    }

    /// Entries that count towards the resource's totals.
    #[must_use]
    pub fn counted_len(&self) -> usize {
        self.items.iter().filter(|item| item.is_counted()).count()
    }
}
