use core::time::Duration;

/// Tunables for one aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Upper bound on each collection or count task.
    pub task_timeout: Duration,

    /// Count open issues by paginating with the pull-request filter instead of trusting
    /// the repository counter, which includes open pull requests.
    pub strict_issue_filtering: bool,

    /// Page budget for listings that are counted by full enumeration.
    pub listing_count_max_pages: u32,

    /// Up to this many pages, the last page of commits is fetched for an exact count.
    pub commit_exact_page_limit: u32,
    pub contributor_exact_page_limit: u32,

    /// Up to this many pages, issues are enumerated for an exact filtered count.
    pub issue_exact_page_limit: u32,

    /// Assumed fullness of the unfetched last page when extrapolating, in `0.0..=1.0`.
    pub commit_last_page_fill: f64,
    pub contributor_last_page_fill: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(60),
            strict_issue_filtering: true,
            listing_count_max_pages: 100,
            commit_exact_page_limit: 100,
            contributor_exact_page_limit: 50,
            issue_exact_page_limit: 10,
            commit_last_page_fill: 0.9,
            contributor_last_page_fill: 0.5,
        }
    }
}
