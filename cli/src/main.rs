use clap::Parser;
use watchmod_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    watchmod_cli::init_tracing();
    watchmod_cli::run(Cli::parse()).await
}
