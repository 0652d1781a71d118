use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use airdrop_allowlist::allocation::read_allocation_file;
use airdrop_allowlist::{
    hex_encode, parse_token_id, write_file_atomic, AllocationRegistry, AllowlistError,
};

#[derive(Args, Debug)]
pub struct Cli {
    /// Allocation list: `address,token_id` or bare `address` per line
    #[arg(short, long)]
    input: PathBuf,

    /// First token id for lines that only carry an address
    #[arg(short, long)]
    start_token_id: Option<String>,

    /// Distribution round identifier
    #[arg(long, env = "AIRDROP_ROUND", default_value_t = 1)]
    round: u64,

    /// Output file for the Merkle root
    #[arg(short, long)]
    root_output: PathBuf,

    /// Output file for the registry snapshot (entries and proofs)
    #[arg(short = 'o', long, env = "AIRDROP_REGISTRY")]
    registry_output: PathBuf,

    /// Output file for every tree level (`level:index:hash` lines)
    #[arg(short, long)]
    tree_output: Option<PathBuf>,
}

pub fn run(cli: Cli) -> Result<()> {
    let start_token_id = cli
        .start_token_id
        .as_deref()
        .map(parse_token_id)
        .transpose()
        .context("Invalid start token id")?;

    info!("Reading allocations from {:?}...", cli.input);
    let entries = read_allocation_file(&cli.input, start_token_id)
        .with_context(|| format!("Failed to read allocation list {:?}", cli.input))?;
    if entries.is_empty() {
        return Err(AllowlistError::EmptyAllocationList)
            .with_context(|| format!("No allocations in {:?}", cli.input));
    }
    info!("Total allocations: {}", entries.len());

    info!("Building Merkle tree for round {}...", cli.round);
    let registry =
        AllocationRegistry::register(&entries, cli.round).context("Failed to register allocations")?;

    info!("Verifying {} proofs against the root...", registry.len());
    registry
        .self_check()
        .context("Self-check failed; refusing to publish root")?;

    let root = registry.published_root()?;
    let tree = registry.tree();
    info!(
        depth = tree.depth(),
        leaves = tree.leaf_count(),
        "Merkle root: {}",
        hex_encode(root)
    );

    write_file_atomic(&cli.root_output, &format!("{}\n", hex_encode(root)))
        .context("Failed to write root file")?;
    registry
        .save(&cli.registry_output)
        .context("Failed to write registry file")?;

    if let Some(tree_path) = cli.tree_output {
        info!("Writing Merkle tree to {:?}...", tree_path);
        write_file_atomic(&tree_path, &tree.level_dump()).context("Failed to write tree file")?;
    }

    println!("{}", hex_encode(root));
    info!("Done!");
    Ok(())
}
