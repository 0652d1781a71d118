//! Proof generation and verification.
//!
//! A proof is just the ordered sibling hashes from leaf to root. No left/right
//! flags are needed because every combine sorts its two inputs.

use crate::common::{hash_sorted_pair, hex_encode, parse_hash, HASH_LEN};
use crate::error::{AllowlistError, Result};
use crate::tree::MerkleTree;

/// Sibling path for one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub leaf: [u8; HASH_LEN],
    pub siblings: Vec<[u8; HASH_LEN]>,
}

impl Proof {
    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    /// Siblings as `0x`-prefixed hex strings, the format claimants submit.
    pub fn to_hex(&self) -> Vec<String> {
        self.siblings.iter().map(hex_encode).collect()
    }

    /// Root this proof reconstructs from its leaf.
    pub fn compute_root(&self) -> [u8; HASH_LEN] {
        compute_root(&self.leaf, &self.siblings)
    }
}

/// Extracts the sibling path for `leaf`.
///
/// At every level the node pairs with its neighbour under the same pairing
/// TreeBuilder used. An unpaired last node contributes nothing and moves up
/// unchanged.
///
/// # Errors
/// `LeafNotFound` if `leaf` is not in level 0.
pub fn generate(tree: &MerkleTree, leaf: &[u8; HASH_LEN]) -> Result<Proof> {
    let mut index = tree
        .position(leaf)
        .ok_or(AllowlistError::LeafNotFound(*leaf))?;

    let mut siblings = Vec::with_capacity(tree.depth());
    let levels = tree.levels();

    // The top level is the root and has no sibling.
    for level in &levels[..levels.len() - 1] {
        let sibling_index = if index.is_multiple_of(2) {
            index + 1
        } else {
            index - 1
        };
        if let Some(sibling) = level.get(sibling_index) {
            siblings.push(*sibling);
        }
        index /= 2;
    }

    Ok(Proof {
        leaf: *leaf,
        siblings,
    })
}

fn compute_root(leaf: &[u8; HASH_LEN], siblings: &[[u8; HASH_LEN]]) -> [u8; HASH_LEN] {
    siblings
        .iter()
        .fold(*leaf, |current, sibling| hash_sorted_pair(&current, sibling))
}

/// Recomputes the root from `leaf` and `siblings` and compares it with
/// `expected_root`. A mismatch is an ordinary `false`, not an error.
pub fn verify(
    leaf: &[u8; HASH_LEN],
    siblings: &[[u8; HASH_LEN]],
    expected_root: &[u8; HASH_LEN],
) -> bool {
    compute_root(leaf, siblings) == *expected_root
}

/// Like [`verify`], but for hex strings as received from a claimant.
///
/// # Errors
/// `InvalidProofFormat` if any value is not a `0x`-prefixed 32-byte hash.
pub fn verify_hex<S: AsRef<str>>(leaf: &str, siblings: &[S], expected_root: &str) -> Result<bool> {
    let leaf = parse_hash(leaf)?;
    let siblings = parse_siblings(siblings)?;
    let expected_root = parse_hash(expected_root)?;
    Ok(verify(&leaf, &siblings, &expected_root))
}

/// Turns a failed verification into `ProofMismatch`.
pub fn ensure_valid(
    leaf: &[u8; HASH_LEN],
    siblings: &[[u8; HASH_LEN]],
    expected_root: &[u8; HASH_LEN],
) -> Result<()> {
    if verify(leaf, siblings, expected_root) {
        Ok(())
    } else {
        Err(AllowlistError::ProofMismatch(*expected_root))
    }
}

/// Parses hex sibling strings, rejecting anything that is not exactly 66
/// characters starting with `0x`.
pub fn parse_siblings<S: AsRef<str>>(siblings: &[S]) -> Result<Vec<[u8; HASH_LEN]>> {
    siblings
        .iter()
        .enumerate()
        .map(|(i, s)| {
            parse_hash(s.as_ref()).map_err(|e| match e {
                AllowlistError::InvalidProofFormat(msg) => {
                    AllowlistError::InvalidProofFormat(format!("proof[{}]: {}", i, msg))
                }
                other => other,
            })
        })
        .collect()
}

/// Parses a pasted proof array such as `["0xabc...", "0xdef..."]`.
///
/// Typographic double quotes are normalised first since proofs are often
/// copied through chat clients and documents.
pub fn parse_proof_json(input: &str) -> Result<Vec<[u8; HASH_LEN]>> {
    let normalised = input.replace(['\u{201c}', '\u{201d}'], "\"");
    let value: serde_json::Value = serde_json::from_str(normalised.trim())
        .map_err(|e| AllowlistError::InvalidProofFormat(format!("not a JSON array: {}", e)))?;
    let items = value
        .as_array()
        .ok_or_else(|| AllowlistError::InvalidProofFormat("not a JSON array".to_string()))?;
    let strings = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str().ok_or_else(|| {
                AllowlistError::InvalidProofFormat(format!("proof[{}] is not a string", i))
            })
        })
        .collect::<Result<Vec<&str>>>()?;
    parse_siblings(&strings)
}
