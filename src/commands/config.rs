use crate::Result;
use crate::analysis::AnalysisSettings;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "repo-pulse.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_task_timeout", with = "humantime_serde")]
    pub task_timeout: Duration,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    #[serde(default = "default_max_rate_limit_pause", with = "humantime_serde")]
    pub max_rate_limit_pause: Duration,

    #[serde(default = "default_true")]
    pub strict_issue_filtering: bool,

    #[serde(default = "default_listing_count_max_pages")]
    pub listing_count_max_pages: u32,

    #[serde(default = "default_commit_exact_page_limit")]
    pub commit_exact_page_limit: u32,

    #[serde(default = "default_contributor_exact_page_limit")]
    pub contributor_exact_page_limit: u32,

    #[serde(default = "default_issue_exact_page_limit")]
    pub issue_exact_page_limit: u32,

    #[serde(default = "default_commit_last_page_fill")]
    pub commit_last_page_fill: f64,

    #[serde(default = "default_contributor_last_page_fill")]
    pub contributor_last_page_fill: f64,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

const fn default_task_timeout() -> Duration {
    Duration::from_secs(60)
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_max_concurrent_requests() -> usize {
    5
}

const fn default_max_rate_limit_pause() -> Duration {
    Duration::from_secs(5 * 60)
}

const fn default_true() -> bool {
    true
}

const fn default_listing_count_max_pages() -> u32 {
    100
}

const fn default_commit_exact_page_limit() -> u32 {
    100
}

const fn default_contributor_exact_page_limit() -> u32 {
    50
}

const fn default_issue_exact_page_limit() -> u32 {
    10
}

const fn default_commit_last_page_fill() -> f64 {
    0.9
}

const fn default_contributor_last_page_fill() -> f64 {
    0.5
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `repo-pulse.toml` in `search_dir` is used when present.
    pub fn load(search_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading repo-pulse configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = search_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
                Err(e) => return Err(e).into_app_err_with(|| format!("reading repo-pulse configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let _ = Url::parse(&self.api_base_url).into_app_err_with(|| format!("api_base_url '{}' is not a valid URL", self.api_base_url))?;

        if self.max_concurrent_requests == 0 {
            return Err(app_err!("max_concurrent_requests must be at least 1"));
        }

        if self.task_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(app_err!("task_timeout and request_timeout must be greater than zero"));
        }

        for (name, value) in [
            ("listing_count_max_pages", self.listing_count_max_pages),
            ("commit_exact_page_limit", self.commit_exact_page_limit),
            ("contributor_exact_page_limit", self.contributor_exact_page_limit),
            ("issue_exact_page_limit", self.issue_exact_page_limit),
        ] {
            if value == 0 {
                return Err(app_err!("{name} must be at least 1"));
            }
        }

        for (name, value) in [
            ("commit_last_page_fill", self.commit_last_page_fill),
            ("contributor_last_page_fill", self.contributor_last_page_fill),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(app_err!("{name} must be between 0 and 1, got {value}"));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            task_timeout: self.task_timeout,
            strict_issue_filtering: self.strict_issue_filtering,
            listing_count_max_pages: self.listing_count_max_pages,
            commit_exact_page_limit: self.commit_exact_page_limit,
            contributor_exact_page_limit: self.contributor_exact_page_limit,
            issue_exact_page_limit: self.issue_exact_page_limit,
            commit_last_page_fill: self.commit_last_page_fill,
            contributor_last_page_fill: self.contributor_last_page_fill,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
