//! Canonical leaf encoding.
//!
//! An [`Entry`] is one `(recipient, token id)` eligibility record. The
//! [`LeafEncoder`] trait turns it into the 32-byte leaf the tree commits to.
//! [`PackedKeccakEncoder`] reproduces Solidity's
//! `keccak256(abi.encodePacked(address, uint256))` bit for bit, which is what
//! the claim contract recomputes on every claim.

use alloy_primitives::U256;
use std::fmt;

use crate::common::{hex_encode, parse_address, ADDRESS_LEN, HASH_LEN};
use crate::error::EntryError;

/// One (recipient, token id) eligibility record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entry {
    pub recipient: [u8; ADDRESS_LEN],
    pub token_id: U256,
}

impl Entry {
    pub fn new(recipient: [u8; ADDRESS_LEN], token_id: U256) -> Self {
        Self {
            recipient,
            token_id,
        }
    }

    /// Builds an entry from user-supplied strings, validating both halves.
    pub fn parse(recipient: &str, token_id: &str) -> Result<Self, EntryError> {
        Ok(Self {
            recipient: parse_address(recipient)?,
            token_id: parse_token_id(token_id)?,
        })
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", hex_encode(self.recipient), self.token_id)
    }
}

/// Parses a token id written in decimal or as `0x`/`0X`-prefixed hex.
///
/// # Errors
/// `InvalidTokenId` for empty input, a leading minus sign, non-digits, or a
/// value that does not fit in 256 bits.
pub fn parse_token_id(s: &str) -> Result<U256, EntryError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(EntryError::InvalidTokenId("empty token id".to_string()));
    }
    if trimmed.starts_with('-') {
        return Err(EntryError::InvalidTokenId(format!(
            "'{}' is negative",
            trimmed
        )));
    }
    let (digits, radix) = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex_digits) => (hex_digits, 16),
        None => (trimmed, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix as u32)) {
        return Err(EntryError::InvalidTokenId(format!(
            "'{}' is not a base-{} integer",
            trimmed, radix
        )));
    }
    let parsed = U256::from_str_radix(digits, radix);
    parsed.map_err(|e| EntryError::InvalidTokenId(format!("'{}': {}", trimmed, e)))
}

/// Strategy for turning an entry into a leaf hash.
///
/// Tree construction, proof generation and verification never look inside a
/// leaf, so a different target environment only needs a new encoder.
pub trait LeafEncoder: Send + Sync {
    fn encode(&self, entry: &Entry) -> [u8; HASH_LEN];

    /// Validates raw strings and encodes them in one step.
    fn encode_raw(&self, recipient: &str, token_id: &str) -> Result<[u8; HASH_LEN], EntryError> {
        Ok(self.encode(&Entry::parse(recipient, token_id)?))
    }
}

/// EVM encoding: `keccak256(address[20] || uint256_be[32])`, no separators.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackedKeccakEncoder;

impl LeafEncoder for PackedKeccakEncoder {
    fn encode(&self, entry: &Entry) -> [u8; HASH_LEN] {
        let mut packed = [0u8; ADDRESS_LEN + 32];
        packed[..ADDRESS_LEN].copy_from_slice(&entry.recipient);
        packed[ADDRESS_LEN..].copy_from_slice(&entry.token_id.to_be_bytes::<32>());
        crate::common::keccak256(&packed)
    }
}
