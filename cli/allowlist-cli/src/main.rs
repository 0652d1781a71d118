#![forbid(unsafe_code)]
#![allow(unreachable_pub)]

use clap::{Parser, Subcommand};

mod build_tree;
mod claim;
mod logging;
mod verify;

#[derive(Parser, Debug)]
#[command(name = "airdrop")]
#[command(about = "Merkle allow-list tools for token airdrops", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the tree, proofs and registry for a distribution round
    BuildTree(build_tree::Cli),
    /// Produce the claim package for one recipient
    Claim(claim::Cli),
    /// Check a claim against a published root
    Verify(verify::Cli),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        logging::LogLevel::Warn
    } else {
        logging::LogLevel::from_verbosity(cli.verbose)
    };
    logging::try_init(level).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::BuildTree(args) => build_tree::run(args)?,
        Commands::Claim(args) => claim::run(args)?,
        Commands::Verify(args) => verify::run(&args)?,
    }

    Ok(())
}
