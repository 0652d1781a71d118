//! Sorted-pair Merkle tree.
//!
//! Leaves are placed in ascending byte order at level 0 and adjacent pairs are
//! combined with [`hash_sorted_pair`]. An unpaired last node is carried to the
//! next level unchanged (never hashed with itself). Both rules together make
//! the root and every proof a function of the leaf set alone, not of the order
//! in which entries were supplied.

use crate::common::{hash_sorted_pair, hex_encode, EMPTY_ROOT, HASH_LEN};
use crate::error::{AllowlistError, Result};

/// An immutable Merkle tree for one distribution round.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    round: u64,
    /// `levels[0]` holds the sorted leaves, the last level holds the root.
    /// Empty when the tree has no leaves.
    levels: Vec<Vec<[u8; HASH_LEN]>>,
}

impl MerkleTree {
    /// Builds the tree for `round` from one leaf per entry.
    ///
    /// # Errors
    /// `DuplicateLeaf` if the same hash appears twice, which means the same
    /// entry was supplied twice upstream.
    pub fn build(mut leaves: Vec<[u8; HASH_LEN]>, round: u64) -> Result<Self> {
        if leaves.is_empty() {
            return Ok(Self {
                round,
                levels: Vec::new(),
            });
        }

        leaves.sort_unstable();
        if let Some(pair) = leaves.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(AllowlistError::DuplicateLeaf(pair[0]));
        }

        let mut levels = vec![leaves];
        while let Some(level) = levels.last().filter(|level| level.len() > 1) {
            let next_level: Vec<[u8; HASH_LEN]> = level
                .chunks(2)
                .map(|chunk| {
                    if chunk.len() == 2 {
                        hash_sorted_pair(&chunk[0], &chunk[1])
                    } else {
                        chunk[0]
                    }
                })
                .collect();
            levels.push(next_level);
        }

        Ok(Self { round, levels })
    }

    /// The root, or [`EMPTY_ROOT`] for a tree with no leaves.
    pub fn root(&self) -> [u8; HASH_LEN] {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(EMPTY_ROOT)
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn levels(&self) -> &[Vec<[u8; HASH_LEN]>] {
        &self.levels
    }

    pub fn leaves(&self) -> &[[u8; HASH_LEN]] {
        self.levels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of levels above the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Position of `leaf` within level 0.
    pub fn position(&self, leaf: &[u8; HASH_LEN]) -> Option<usize> {
        self.leaves().binary_search(leaf).ok()
    }

    /// Renders every node as a `level:index:0xhash` line.
    pub fn level_dump(&self) -> String {
        let mut out = String::new();
        for (level_num, level) in self.levels.iter().enumerate() {
            for (i, hash) in level.iter().enumerate() {
                out.push_str(&format!("{}:{}:{}\n", level_num, i, hex_encode(hash)));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(byte: u8) -> [u8; 32] {
        [byte; 32]
    }

    #[test]
    fn test_empty_tree_has_sentinel_root() {
        let tree = MerkleTree::build(vec![], 1).unwrap();
        assert_eq!(tree.root(), EMPTY_ROOT);
        assert!(tree.levels().is_empty());
        assert!(tree.is_empty());
        assert_eq!(tree.leaf_count(), 0);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_single_leaf_is_root() {
        let tree = MerkleTree::build(vec![h(9)], 1).unwrap();
        assert_eq!(tree.root(), h(9));
        assert_eq!(tree.levels().len(), 1);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_two_leaves() {
        let tree = MerkleTree::build(vec![h(2), h(1)], 1).unwrap();
        assert_eq!(tree.leaves(), &[h(1), h(2)]);
        assert_eq!(tree.root(), hash_sorted_pair(&h(1), &h(2)));
    }

    #[test]
    fn test_odd_node_is_carried_forward() {
        let tree = MerkleTree::build(vec![h(1), h(2), h(3)], 1).unwrap();
        let levels = tree.levels();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[1], vec![hash_sorted_pair(&h(1), &h(2)), h(3)]);
        assert_eq!(
            tree.root(),
            hash_sorted_pair(&hash_sorted_pair(&h(1), &h(2)), &h(3))
        );
    }

    #[test]
    fn test_level_sizes_halve_rounding_up() {
        let leaves: Vec<[u8; 32]> = (1..=11).map(h).collect();
        let tree = MerkleTree::build(leaves, 1).unwrap();
        let sizes: Vec<usize> = tree.levels().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![11, 6, 3, 2, 1]);
        assert_eq!(tree.depth(), 4);
    }

    #[test]
    fn test_insertion_order_does_not_change_root() {
        let forward = MerkleTree::build(vec![h(1), h(2), h(3), h(4), h(5)], 1).unwrap();
        let shuffled = MerkleTree::build(vec![h(4), h(1), h(5), h(3), h(2)], 1).unwrap();
        assert_eq!(forward.root(), shuffled.root());
        assert_eq!(forward.levels(), shuffled.levels());
    }

    #[test]
    fn test_duplicate_leaf_rejected() {
        let result = MerkleTree::build(vec![h(1), h(2), h(1)], 1);
        assert!(matches!(result, Err(AllowlistError::DuplicateLeaf(leaf)) if leaf == h(1)));
    }

    #[test]
    fn test_round_is_recorded() {
        let tree = MerkleTree::build(vec![h(1)], 42).unwrap();
        assert_eq!(tree.round(), 42);
    }

    #[test]
    fn test_position_lookup() {
        let tree = MerkleTree::build(vec![h(3), h(1), h(2)], 1).unwrap();
        assert_eq!(tree.position(&h(1)), Some(0));
        assert_eq!(tree.position(&h(3)), Some(2));
        assert_eq!(tree.position(&h(7)), None);
    }

    #[test]
    fn test_level_dump_format() {
        let tree = MerkleTree::build(vec![h(1), h(2)], 1).unwrap();
        let dump = tree.level_dump();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], format!("0:0:0x{}", "01".repeat(32)));
        assert_eq!(lines[2], format!("1:0:0x{}", hex::encode(tree.root())));
    }
}
