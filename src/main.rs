// src/main.rs

use tapline::{cli, logging, run};
use tracing::debug;

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("tapline error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        command = %args.command,
        "tapline starting"
    );
    run(args).await
}
