//! Command-line interface for repo-pulse
//!
//! The `run` function parses the arguments and routes to one of three commands:
//!
//! - **select**: resolve a repository, aggregate its activity, replace the stored
//!   analysis, mirror it into the graph directory when one is given, and print the result
//! - **show**: print a previously stored analysis by repository id
//! - **top**: rank contributors of a mirrored repository, optionally with a commit timeline
//!
//! Settings come from `repo-pulse.toml` (see `default_config.toml` for every key) and
//! the shared command-line options in `common`.

mod common;
mod config;
mod host;
mod run;
mod select;
mod show;
mod top;

pub use config::Config;
pub use host::Host;
pub use run::run;
pub use select::{SelectArgs, select_repository};
pub use show::{ShowArgs, show_analysis};
pub use top::{TopArgs, top_contributors};
