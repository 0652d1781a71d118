use sha3::{Digest, Keccak256};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{AllowlistError, EntryError};

/// Width of every hash handled by the tree (Keccak-256 output).
pub const HASH_LEN: usize = 32;

/// Width of an EVM address.
pub const ADDRESS_LEN: usize = 20;

/// Root reported for a tree with no leaves.
pub const EMPTY_ROOT: [u8; HASH_LEN] = [0u8; HASH_LEN];

/// Parses an Ethereum address from a hex string.
///
/// # Arguments
/// * `addr_str` - The address string, with or without "0x" prefix
///
/// # Errors
/// Returns `InvalidRecipient` if the address is not 40 hex characters,
/// contains invalid hex, or is the zero address
pub fn parse_address(addr_str: &str) -> Result<[u8; ADDRESS_LEN], EntryError> {
    let trimmed = addr_str.trim();
    let cleaned = strip_hex_prefix(trimmed);
    if cleaned.len() != ADDRESS_LEN * 2 {
        return Err(EntryError::InvalidRecipient(format!(
            "expected 40 hex chars, got {} in '{}'",
            cleaned.len(),
            trimmed
        )));
    }
    let mut address = [0u8; ADDRESS_LEN];
    hex::decode_to_slice(cleaned, &mut address).map_err(|e| {
        EntryError::InvalidRecipient(format!("invalid hex in '{}': {}", trimmed, e))
    })?;
    if address == [0u8; ADDRESS_LEN] {
        return Err(EntryError::InvalidRecipient(
            "zero address not allowed".to_string(),
        ));
    }
    Ok(address)
}

/// Parses a 32-byte hash written as `0x` followed by 64 hex characters.
///
/// The prefix is mandatory: this is the format claimants paste and the format
/// the external verifier accepts.
pub fn parse_hash(hash_str: &str) -> Result<[u8; HASH_LEN], AllowlistError> {
    let trimmed = hash_str.trim();
    let Some(body) = trimmed.strip_prefix("0x") else {
        return Err(AllowlistError::InvalidProofFormat(format!(
            "'{}' is missing the 0x prefix",
            trimmed
        )));
    };
    if body.len() != HASH_LEN * 2 {
        return Err(AllowlistError::InvalidProofFormat(format!(
            "expected 66 chars, got {} in '{}'",
            trimmed.len(),
            trimmed
        )));
    }
    let mut hash = [0u8; HASH_LEN];
    hex::decode_to_slice(body, &mut hash)
        .map_err(|e| AllowlistError::InvalidProofFormat(format!("'{}': {}", trimmed, e)))?;
    Ok(hash)
}

/// Formats bytes as lowercase hex with a `0x` prefix.
pub fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Computes the Keccak-256 hash of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> [u8; HASH_LEN] {
    Keccak256::digest(data).into()
}

/// Combines two child hashes into their parent.
///
/// The smaller hash (byte-lexicographic) always goes first, so
/// `hash_sorted_pair(a, b) == hash_sorted_pair(b, a)`. This matches the
/// `sortPairs` convention checked by on-chain verifiers.
pub fn hash_sorted_pair(a: &[u8; HASH_LEN], b: &[u8; HASH_LEN]) -> [u8; HASH_LEN] {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    Keccak256::new()
        .chain_update(first)
        .chain_update(second)
        .finalize()
        .into()
}

/// Writes `contents` to `path` through a temporary sibling file and a rename,
/// so readers never observe a half-written file.
pub fn write_file_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(&temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_with_prefix() {
        let addr = "0x1234567890abcdef1234567890abcdef12345678";
        let result = parse_address(addr).unwrap();
        assert_eq!(result[0], 0x12);
        assert_eq!(result[19], 0x78);
    }

    #[test]
    fn test_parse_address_without_prefix() {
        let addr = "1234567890abcdef1234567890abcdef12345678";
        assert!(parse_address(addr).is_ok());
    }

    #[test]
    fn test_parse_address_mixed_case() {
        let addr = "0xAbCdEf0123456789aBcDeF0123456789AbCdEf01";
        assert!(parse_address(addr).is_ok());
    }

    #[test]
    fn test_parse_address_invalid_length() {
        let result = parse_address("0x1234");
        assert!(matches!(result, Err(EntryError::InvalidRecipient(_))));
    }

    #[test]
    fn test_parse_address_invalid_hex() {
        let result = parse_address("0xghijklmnopqrstuvwxyz1234567890abcdef1234");
        assert!(matches!(result, Err(EntryError::InvalidRecipient(_))));
    }

    #[test]
    fn test_parse_address_zero_rejected() {
        let result = parse_address("0x0000000000000000000000000000000000000000");
        assert!(matches!(result, Err(EntryError::InvalidRecipient(_))));
    }

    #[test]
    fn test_parse_hash() {
        let s = format!("0x{}", "ab".repeat(32));
        assert_eq!(parse_hash(&s).unwrap(), [0xab; 32]);
    }

    #[test]
    fn test_parse_hash_requires_prefix() {
        let s = "ab".repeat(32);
        assert!(matches!(
            parse_hash(&s),
            Err(AllowlistError::InvalidProofFormat(_))
        ));
    }

    #[test]
    fn test_parse_hash_wrong_width() {
        let s = format!("0x{}", "ab".repeat(31));
        assert!(matches!(
            parse_hash(&s),
            Err(AllowlistError::InvalidProofFormat(_))
        ));
    }

    #[test]
    fn test_hex_encode() {
        assert_eq!(hex_encode([0x01, 0xff]), "0x01ff");
    }

    #[test]
    fn test_keccak256_known_vectors() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            hex::encode(keccak256(b"abc")),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn test_hash_sorted_pair_is_commutative() {
        let left = [1u8; 32];
        let right = [2u8; 32];
        assert_eq!(hash_sorted_pair(&left, &right), hash_sorted_pair(&right, &left));
    }

    #[test]
    fn test_hash_sorted_pair_orders_smaller_first() {
        let small = [1u8; 32];
        let large = [2u8; 32];
        let mut concat = [0u8; 64];
        concat[..32].copy_from_slice(&small);
        concat[32..].copy_from_slice(&large);
        assert_eq!(hash_sorted_pair(&large, &small), keccak256(&concat));
    }

    #[test]
    fn test_write_file_atomic() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("root.txt");
        write_file_atomic(&path, "0xabc\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0xabc\n");
        assert!(!path.with_extension("tmp").exists());
    }
}
