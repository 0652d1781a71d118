use anyhow::{Context, Result};
use clap::Args;
use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};
use std::path::PathBuf;
use tracing::info;
use zeroize::Zeroize;

use airdrop_allowlist::{
    hex_encode, parse_address, parse_hash, parse_token_id, write_file_atomic, AllocationRegistry,
};

#[derive(Args, Debug)]
pub struct Cli {
    /// Registry snapshot written by `build-tree`
    #[arg(short = 'g', long, env = "AIRDROP_REGISTRY")]
    registry: PathBuf,

    /// Recipient address
    #[arg(short, long, required_unless_present = "private_key")]
    recipient: Option<String>,

    /// Derive the recipient from this private key (hex, with or without 0x).
    /// Use "-" to read it from stdin instead of the command line.
    #[arg(short = 'k', long, conflicts_with = "recipient")]
    private_key: Option<String>,

    /// Token id to claim; may be omitted when the recipient has exactly one
    #[arg(short, long)]
    token_id: Option<String>,

    /// Output JSON file for the claim package
    #[arg(short, long)]
    output: PathBuf,

    /// Root the claim contract currently holds; the registry must match it
    #[arg(long)]
    root: Option<String>,
}

/// Derives the Ethereum address of a secp256k1 key: the last 20 bytes of the
/// Keccak-256 hash of the uncompressed public key without its 0x04 tag.
pub fn private_key_to_address(signing_key: &SigningKey) -> [u8; 20] {
    let public_key = signing_key.verifying_key();
    let encoded = public_key.to_encoded_point(false);
    let pub_bytes = encoded.as_bytes();
    let hash = Keccak256::digest(&pub_bytes[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..32]);
    address
}

fn read_private_key(arg: &str) -> Result<SigningKey> {
    let mut key_str = if arg == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read private key from stdin")?;
        let trimmed = buffer.trim().to_string();
        buffer.zeroize();
        trimmed
    } else {
        arg.trim().to_string()
    };

    let decoded = {
        let hex_str = key_str.strip_prefix("0x").unwrap_or(&key_str);
        if hex_str.is_empty() {
            key_str.zeroize();
            anyhow::bail!("Private key is empty");
        }
        hex::decode(hex_str)
    };
    key_str.zeroize();
    let mut key_bytes = decoded.context("Invalid private key format")?;

    if key_bytes.len() != 32 {
        let len = key_bytes.len();
        key_bytes.zeroize();
        anyhow::bail!("Invalid private key length: expected 32 bytes, got {}", len);
    }
    let signing_key = SigningKey::from_slice(&key_bytes).context("Invalid private key");
    key_bytes.zeroize();
    signing_key
}

pub fn run(cli: Cli) -> Result<()> {
    let recipient = match (&cli.recipient, &cli.private_key) {
        (Some(recipient), _) => parse_address(recipient).context("Invalid recipient address")?,
        (None, Some(key)) => {
            info!("Deriving address from private key...");
            let signing_key = read_private_key(key)?;
            private_key_to_address(&signing_key)
        }
        (None, None) => anyhow::bail!("Either --recipient or --private-key is required"),
    };

    info!("Loading registry from {:?}...", cli.registry);
    let registry = AllocationRegistry::load(&cli.registry).context("Failed to load registry")?;

    if let Some(expected) = &cli.root {
        let expected = parse_hash(expected).context("Invalid Merkle root")?;
        if expected != registry.root() {
            anyhow::bail!(
                "Registry root {} does not match expected root {}",
                hex_encode(registry.root()),
                hex_encode(expected)
            );
        }
    }

    let token_id = match &cli.token_id {
        Some(token_id) => parse_token_id(token_id).context("Invalid token id")?,
        None => {
            let owned = registry.token_ids_for(&recipient);
            match owned.as_slice() {
                [only] => *only,
                [] => anyhow::bail!("Address {} is not in the allow-list", hex_encode(recipient)),
                many => anyhow::bail!(
                    "Address {} holds {} allocations ({}); pass --token-id",
                    hex_encode(recipient),
                    many.len(),
                    many.iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }
        }
    };

    info!("Looking up proof for {} / token {}...", hex_encode(recipient), token_id);
    let package = registry
        .claim_package(&recipient, token_id)
        .context("Address and token id are not in the allow-list")?;

    if !package
        .verify(&registry.root())
        .context("Generated claim is malformed")?
    {
        anyhow::bail!("Generated proof does not verify against the registry root");
    }

    info!("Writing claim JSON to {:?}...", cli.output);
    let json_output = serde_json::to_string_pretty(&package).context("Failed to serialize JSON")?;
    write_file_atomic(&cli.output, &json_output).context("Failed to write claim file")?;

    info!("Recipient: {}", package.recipient);
    info!("Token id: {}", package.token_id);
    info!("Proof length: {} nodes", package.proof.len());
    println!("{}", json_output);

    Ok(())
}
