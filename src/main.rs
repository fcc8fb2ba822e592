use anyhow::Result;
use clap::Parser;
use tutor_ai::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    tutor_ai::run(args).await
}
