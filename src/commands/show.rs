use super::Host;
use super::common::CommonArgs;
use crate::Result;
use crate::store::AnalysisStore;
use clap::Parser;
use ohno::IntoAppError;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Numeric repository id, as printed by `select`
    #[arg(value_name = "ID")]
    pub repository_id: u64,
}

pub fn show_analysis<H: Host>(host: &mut H, common: &CommonArgs, args: &ShowArgs) -> Result<()> {
    show_from(host, &common.store()?, args)
}

fn show_from<H: Host>(host: &mut H, store: &impl AnalysisStore, args: &ShowArgs) -> Result<()> {
    let Some(analysis) = store.get(args.repository_id)? else {
        let _ = writeln!(host.error(), "No analysis stored for repository {}", args.repository_id);
        host.exit(1);
        return Ok(());
    };

    let json = serde_json::to_string_pretty(&analysis).into_app_err("serializing the analysis")?;
    let _ = writeln!(host.output(), "{json}");
    Ok(())
}
