//! Allocation list parsing.
//!
//! One entry per line. `address,token_id` gives an explicit id; a bare
//! `address` takes the next sequential id counting up from a start id. Blank
//! lines and `#` comments are skipped. Every bad line is collected so the
//! issuer can fix the list in one pass.

use alloy_primitives::U256;
use std::path::Path;

use crate::common::parse_address;
use crate::error::{AllowlistError, EntryError, IndexedEntryError, Result};
use crate::leaf::{parse_token_id, Entry};

/// Parses an allocation list.
///
/// Errors carry 1-based line numbers.
pub fn parse_allocation_list(input: &str, start_token_id: Option<U256>) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut errors = Vec::new();
    let mut sequential = 0u64;

    for (line_num, line) in input.lines().enumerate() {
        let trimmed = line.split('#').next().unwrap_or("").trim();
        if trimmed.is_empty() {
            continue;
        }

        let parsed = match trimmed.split_once(',') {
            Some((address, token_id)) => parse_explicit(address, token_id),
            None => {
                let offset = sequential;
                sequential += 1;
                parse_sequential(trimmed, start_token_id, offset)
            }
        };

        match parsed {
            Ok(entry) => entries.push(entry),
            Err(error) => errors.push(IndexedEntryError::at_line(line_num + 1, error)),
        }
    }

    if !errors.is_empty() {
        return Err(AllowlistError::InvalidEntries(errors));
    }
    Ok(entries)
}

fn parse_explicit(address: &str, token_id: &str) -> std::result::Result<Entry, EntryError> {
    let recipient = parse_address(address)?;
    let token_id = parse_token_id(token_id)?;
    Ok(Entry::new(recipient, token_id))
}

fn parse_sequential(
    address: &str,
    start_token_id: Option<U256>,
    offset: u64,
) -> std::result::Result<Entry, EntryError> {
    let recipient = parse_address(address)?;
    let start = start_token_id.ok_or_else(|| {
        EntryError::InvalidTokenId("no token id given and no start token id set".to_string())
    })?;
    let token_id = start.checked_add(U256::from(offset)).ok_or_else(|| {
        EntryError::InvalidTokenId(format!("start {} + {} overflows 256 bits", start, offset))
    })?;
    Ok(Entry::new(recipient, token_id))
}

/// Reads and parses an allocation list file.
pub fn read_allocation_file(path: &Path, start_token_id: Option<U256>) -> Result<Vec<Entry>> {
    let content = std::fs::read_to_string(path)?;
    parse_allocation_list(&content, start_token_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntryPosition;

    const A: &str = "0x1111111111111111111111111111111111111111";
    const B: &str = "0x2222222222222222222222222222222222222222";
    const C: &str = "0x3333333333333333333333333333333333333333";

    #[test]
    fn test_explicit_ids() {
        let input = format!("{},5\n{}, 0x10\n", A, B);
        let entries = parse_allocation_list(&input, None).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].token_id, U256::from(5u64));
        assert_eq!(entries[1].token_id, U256::from(16u64));
    }

    #[test]
    fn test_sequential_ids_from_start() {
        let input = format!("{}\n{}\n{}\n", A, B, C);
        let entries = parse_allocation_list(&input, Some(U256::from(100u64))).unwrap();
        let ids: Vec<U256> = entries.iter().map(|e| e.token_id).collect();
        assert_eq!(
            ids,
            vec![U256::from(100u64), U256::from(101u64), U256::from(102u64)]
        );
    }

    #[test]
    fn test_mixed_lines_count_only_bare_addresses() {
        let input = format!("{}\n{},7\n{}\n", A, B, C);
        let entries = parse_allocation_list(&input, Some(U256::from(1u64))).unwrap();
        assert_eq!(entries[0].token_id, U256::from(1u64));
        assert_eq!(entries[1].token_id, U256::from(7u64));
        assert_eq!(entries[2].token_id, U256::from(2u64));
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let input = format!("# round 3\n\n{},1 # first\n   \n", A);
        let entries = parse_allocation_list(&input, None).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_bare_address_without_start_id() {
        let err = parse_allocation_list(A, None).unwrap_err();
        match err {
            AllowlistError::InvalidEntries(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(matches!(errors[0].error, EntryError::InvalidTokenId(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_all_bad_lines_reported_with_line_numbers() {
        let input = format!("{},1\n0xdead,2\n\n{},-3\n{},4\n", A, B, C);
        match parse_allocation_list(&input, None).unwrap_err() {
            AllowlistError::InvalidEntries(errors) => {
                let lines: Vec<EntryPosition> = errors.iter().map(|e| e.position).collect();
                assert_eq!(lines, vec![EntryPosition::Line(2), EntryPosition::Line(4)]);
                assert!(matches!(errors[0].error, EntryError::InvalidRecipient(_)));
                assert!(matches!(errors[1].error, EntryError::InvalidTokenId(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_sequential_overflow() {
        let input = format!("{}\n{}\n", A, B);
        match parse_allocation_list(&input, Some(U256::MAX)).unwrap_err() {
            AllowlistError::InvalidEntries(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].position, EntryPosition::Line(2));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_yields_no_entries() {
        assert!(parse_allocation_list("\n# nothing\n", None).unwrap().is_empty());
    }
}
