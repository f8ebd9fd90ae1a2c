use clap::Parser;
use tracing_subscriber::EnvFilter;

mod assembly;
mod builder;
mod cli;
mod core;
mod curation;
mod homology;
mod parsing;
mod report;
mod troubleshoot;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("me_builder=debug,info")
    } else {
        EnvFilter::new("me_builder=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Build(args) => {
            cli::build::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Check(args) => {
            cli::check::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Kinds(args) => {
            cli::kinds::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
