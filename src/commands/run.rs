//! Command dispatch logic for repo-pulse

use super::common::{CommonArgs, init_logging};
use super::{SelectArgs, ShowArgs, TopArgs, select_repository, show_analysis, top_contributors};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "repo-pulse", version, author, long_about = None)]
#[command(about = "Aggregate repository activity into precision-tagged metrics")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: PulseSubcommand,
}

#[derive(Subcommand, Debug)]
enum PulseSubcommand {
    /// Analyze a repository, store the result, and print it
    Select(SelectArgs),
    /// Print the stored analysis of a repository
    Show(ShowArgs),
    /// Rank the contributors of a mirrored repository
    Top(TopArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// # Errors
///
/// Returns an error if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.common.log_level);

    match &cli.command {
        PulseSubcommand::Select(args) => select_repository(host, &cli.common, args).await,
        PulseSubcommand::Show(args) => show_analysis(host, &cli.common, args),
        PulseSubcommand::Top(args) => top_contributors(host, &cli.common, args).await,
    }
}
