use super::Host;
use super::common::CommonArgs;
use crate::Result;
use crate::graph::GraphMirror;
use crate::hosting::HostingApi;
use crate::service::{ProviderResult, RepositoryService};
use crate::store::AnalysisStore;
use clap::Parser;
use ohno::IntoAppError;
use std::io::Write;
use std::sync::Arc;

#[derive(Parser, Debug)]
pub struct SelectArgs {
    /// Repository as `owner/name` or a repository URL
    #[arg(value_name = "REPOSITORY")]
    pub repository: String,

    /// Print compact JSON instead of pretty-printed JSON
    #[arg(long)]
    pub compact: bool,
}

pub async fn select_repository<H: Host>(host: &mut H, common: &CommonArgs, args: &SelectArgs) -> Result<()> {
    let config = common.load_config()?;
    let api = Arc::new(common.github(&config)?);
    let service = RepositoryService::new(api, common.store()?, config.analysis_settings());

    match common.graph() {
        Some(graph) => select_with(host, &service.with_graph(graph), args).await,
        None => select_with(host, &service, args).await,
    }
}

async fn select_with<H, A, S, G>(host: &mut H, service: &RepositoryService<A, S, G>, args: &SelectArgs) -> Result<()>
where
    H: Host,
    A: HostingApi,
    S: AnalysisStore,
    G: GraphMirror,
{
    let selection = match service.select_repository(&args.repository).await {
        ProviderResult::Found(selection) => selection,
        ProviderResult::Invalid(reason) | ProviderResult::NotFound(reason) => {
            let _ = writeln!(host.error(), "{reason}");
            host.exit(1);
            return Ok(());
        }
        ProviderResult::Error(e) => {
            let _ = writeln!(host.error(), "Unable to analyze '{}': {e:#}", args.repository);
            host.exit(1);
            return Ok(());
        }
    };

    let json = if args.compact {
        serde_json::to_string(&selection)
    } else {
        serde_json::to_string_pretty(&selection)
    }
    .into_app_err("serializing the analysis")?;

    let _ = writeln!(host.output(), "{json}");
    Ok(())
}
