//! Collect repository activity from GitHub into precision-tagged aggregate metrics.

use repo_pulse::{Host, run};
use std::io::{Write, stderr, stdout};

/// Writes to the process's standard streams.
#[derive(Debug, Clone, Copy, Default)]
struct StdHost;

impl Host for StdHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[tokio::main]
async fn main() -> repo_pulse::Result<()> {
    run(&mut StdHost, std::env::args()).await
}
