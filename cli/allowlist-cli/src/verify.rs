use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use airdrop_allowlist::proof::parse_proof_json;
use airdrop_allowlist::{
    hex_encode, parse_hash, AllowlistError, ClaimPackage, LeafEncoder, PackedKeccakEncoder,
};

#[derive(Args, Debug)]
pub struct Cli {
    /// Claim package JSON written by `claim`
    #[arg(short, long, required_unless_present_all = ["recipient", "token_id", "proof"])]
    claim: Option<PathBuf>,

    /// Recipient address, when checking a pasted proof instead of a file
    #[arg(long, conflicts_with = "claim", requires_all = ["token_id", "proof"])]
    recipient: Option<String>,

    /// Token id, when checking a pasted proof
    #[arg(long, conflicts_with = "claim")]
    token_id: Option<String>,

    /// Proof as a JSON array of 0x-prefixed hashes
    #[arg(long, conflicts_with = "claim")]
    proof: Option<String>,

    /// Root published to the claim contract
    #[arg(short, long)]
    root: String,
}

fn load_claim(cli: &Cli) -> Result<ClaimPackage> {
    if let Some(path) = &cli.claim {
        info!("Reading claim from {:?}...", path);
        let content = fs::read_to_string(path).context("Failed to read claim file")?;
        return serde_json::from_str(&content).context("Failed to parse claim JSON");
    }

    let (Some(recipient), Some(token_id), Some(proof)) = (&cli.recipient, &cli.token_id, &cli.proof)
    else {
        anyhow::bail!("Pass --claim or all of --recipient, --token-id and --proof");
    };
    let siblings = parse_proof_json(proof).context("Invalid Merkle proof")?;
    Ok(ClaimPackage {
        merkle_root: cli.root.clone(),
        recipient: recipient.clone(),
        token_id: token_id.clone(),
        proof: siblings.iter().map(hex_encode).collect(),
    })
}

pub fn run(cli: &Cli) -> Result<()> {
    let root = parse_hash(&cli.root).context("Invalid Merkle root")?;
    let claim = load_claim(cli)?;

    if !claim.merkle_root.eq_ignore_ascii_case(cli.root.trim()) {
        warn!(
            "Claim was issued for root {}, checking against {}",
            claim.merkle_root,
            hex_encode(root)
        );
    }

    let leaf = PackedKeccakEncoder
        .encode_raw(&claim.recipient, &claim.token_id)
        .context("Invalid claim entry")?;
    info!("Leaf: {}", hex_encode(leaf));

    if claim.verify(&root).context("Invalid Merkle proof")? {
        println!("valid");
        Ok(())
    } else {
        println!("invalid");
        Err(AllowlistError::ProofMismatch(root).into())
    }
}
