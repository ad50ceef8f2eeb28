use super::Host;
use super::common::CommonArgs;
use crate::Result;
use crate::analysis::RepoName;
use crate::graph::GraphMirror;
use clap::Parser;
use ohno::bail;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct TopArgs {
    /// Repository as `owner/name` or a repository URL
    #[arg(value_name = "REPOSITORY")]
    pub repository: String,

    /// Number of contributors to list
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Also print the number of mirrored commits per day
    #[arg(long)]
    pub timeline: bool,
}

pub async fn top_contributors<H: Host>(host: &mut H, common: &CommonArgs, args: &TopArgs) -> Result<()> {
    let Some(graph) = common.graph() else {
        bail!("the 'top' command reads the graph mirror; pass --graph-dir");
    };

    top_from(host, &graph, args).await
}

async fn top_from<H: Host>(host: &mut H, graph: &impl GraphMirror, args: &TopArgs) -> Result<()> {
    let name = RepoName::parse(&args.repository)?;

    let Some(document) = graph.load(&name.to_string()).await? else {
        let _ = writeln!(host.error(), "Nothing mirrored for '{name}'; run 'select' first");
        host.exit(1);
        return Ok(());
    };

    let ranked = document.top_contributors(args.limit);
    let width = ranked.iter().map(|(login, _)| login.len()).max().unwrap_or(0);

    let mut out = host.output();
    for (login, contributions) in &ranked {
        let _ = writeln!(out, "{login:<width$}  {contributions}");
    }

    if args.timeline {
        let _ = writeln!(out);
        for (day, commits) in document.commit_timeline() {
            let _ = writeln!(out, "{day}  {commits}");
        }
    }

    Ok(())
}
