//! Arguments and setup shared by every command.

use super::config::Config;
use crate::Result;
use crate::graph::JsonGraphSink;
use crate::hosting::{Client, GitHubApi};
use crate::store::FileStore;
use camino::Utf8PathBuf;
use clap::{Args, ValueEnum};
use directories::ProjectDirs;
use ohno::IntoAppError;

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Arguments shared by every command
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    pub github_token: Option<String>,

    /// Path to configuration file (default is `repo-pulse.toml`)
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Directory where analyses are stored
    #[arg(long, value_name = "PATH", global = true)]
    pub store_dir: Option<Utf8PathBuf>,

    /// Directory where the graph mirror is written; no mirroring when omitted
    #[arg(long, value_name = "PATH", global = true)]
    pub graph_dir: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,
}

impl CommonArgs {
    pub fn load_config(&self) -> Result<Config> {
        let cwd = std::env::current_dir().into_app_err("determining the working directory")?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|p| ohno::app_err!("working directory '{}' is not valid UTF-8", p.display()))?;
        Config::load(&cwd, self.config.as_ref())
    }

    pub fn store(&self) -> Result<FileStore> {
        let dir = if let Some(dir) = &self.store_dir {
            dir.clone()
        } else {
            let dirs = ProjectDirs::from("", "", "repo-pulse").into_app_err("could not determine data directory")?;
            Utf8PathBuf::from_path_buf(dirs.data_dir().join("analyses"))
                .map_err(|p| ohno::app_err!("data directory '{}' is not valid UTF-8", p.display()))?
        };

        FileStore::new(dir)
    }

    #[must_use]
    pub fn graph(&self) -> Option<JsonGraphSink> {
        self.graph_dir.clone().map(JsonGraphSink::new)
    }

    pub fn github(&self, config: &Config) -> Result<GitHubApi> {
        let client = Client::new(self.github_token.as_deref(), config.api_base_url.as_str(), config.request_timeout)?;
        Ok(GitHubApi::new(client, config.max_concurrent_requests, config.max_rate_limit_pause))
    }
}

pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // A logger may already be installed when commands run more than once in-process.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}
