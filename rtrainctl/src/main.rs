use anyhow::Result;
use clap::{Parser, Subcommand};

mod describe;
mod utils;
mod validate;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an experiment configuration file for errors.
    Validate(validate::Arg),
    /// Show the parsed experiment configuration in a readable form.
    Describe(describe::Arg),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Validate(arg) => arg.handle()?,
        Commands::Describe(arg) => arg.handle()?,
    }

    Ok(())
}
