//! Per-round allocation registry.
//!
//! The registry is built once from the full entry list: every entry is
//! validated and encoded, the tree is built, and a proof is generated for each
//! entry up front. After that it only answers lookups. A new round gets a new
//! registry.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::common::{hex_encode, parse_hash, write_file_atomic, ADDRESS_LEN, HASH_LEN};
use crate::error::{AllowlistError, EntryError, IndexedEntryError, Result};
use crate::leaf::{Entry, LeafEncoder, PackedKeccakEncoder};
use crate::proof::{self, Proof};
use crate::tree::MerkleTree;

/// An entry together with its proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub entry: Entry,
    pub proof: Proof,
}

/// Proof material handed to a claimant, ready for the claim call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimPackage {
    pub merkle_root: String,
    pub recipient: String,
    pub token_id: String,
    pub proof: Vec<String>,
}

impl ClaimPackage {
    /// Recomputes the leaf with `encoder` and checks the proof against
    /// `expected_root`.
    ///
    /// Returns `Ok(false)` on a mismatch; malformed fields are errors.
    pub fn verify_with<E: LeafEncoder>(&self, encoder: &E, expected_root: &[u8; HASH_LEN]) -> Result<bool> {
        let leaf = encoder
            .encode_raw(&self.recipient, &self.token_id)
            .map_err(|error| AllowlistError::InvalidEntries(vec![IndexedEntryError::at_entry(0, error)]))?;
        let siblings = proof::parse_siblings(&self.proof)?;
        Ok(proof::verify(&leaf, &siblings, expected_root))
    }

    pub fn verify(&self, expected_root: &[u8; HASH_LEN]) -> Result<bool> {
        self.verify_with(&PackedKeccakEncoder, expected_root)
    }
}

/// Read-only index from entry to proof for one round.
#[derive(Debug, Clone)]
pub struct AllocationRegistry {
    tree: MerkleTree,
    allocations: Vec<Allocation>,
    index: HashMap<Entry, usize>,
}

impl AllocationRegistry {
    /// Registers `entries` for `round` using the EVM leaf encoding.
    pub fn register(entries: &[Entry], round: u64) -> Result<Self> {
        Self::register_with(&PackedKeccakEncoder, entries, round)
    }

    /// Registers `entries` with a specific leaf encoder.
    ///
    /// # Errors
    /// * `InvalidEntries` listing every entry that failed validation
    /// * `DuplicateLeaf` if two entries encode to the same leaf
    pub fn register_with<E: LeafEncoder>(encoder: &E, entries: &[Entry], round: u64) -> Result<Self> {
        let errors: Vec<IndexedEntryError> = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.recipient == [0u8; ADDRESS_LEN])
            .map(|(index, _)| {
                IndexedEntryError::at_entry(
                    index,
                    EntryError::InvalidRecipient("zero address not allowed".to_string()),
                )
            })
            .collect();
        if !errors.is_empty() {
            return Err(AllowlistError::InvalidEntries(errors));
        }

        let leaves: Vec<[u8; HASH_LEN]> = entries.iter().map(|entry| encoder.encode(entry)).collect();
        debug!(round, entries = entries.len(), "encoded leaves");

        let tree = MerkleTree::build(leaves.clone(), round)?;
        debug!(round, depth = tree.depth(), root = %hex_encode(tree.root()), "built tree");

        let mut allocations = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        for (position, (entry, leaf)) in entries.iter().zip(&leaves).enumerate() {
            let proof = proof::generate(&tree, leaf)?;
            allocations.push(Allocation {
                entry: *entry,
                proof,
            });
            index.insert(*entry, position);
        }
        debug!(round, proofs = allocations.len(), "generated proofs");

        Ok(Self {
            tree,
            allocations,
            index,
        })
    }

    /// The root, or the all-zero sentinel if nothing was registered.
    pub fn root(&self) -> [u8; HASH_LEN] {
        self.tree.root()
    }

    /// The root to hand to the on-chain verifier.
    ///
    /// # Errors
    /// `EmptyAllocationList` for an empty round; the sentinel root must never
    /// be published.
    pub fn published_root(&self) -> Result<[u8; HASH_LEN]> {
        if self.is_empty() {
            return Err(AllowlistError::EmptyAllocationList);
        }
        Ok(self.root())
    }

    pub fn round(&self) -> u64 {
        self.tree.round()
    }

    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Allocations in registration order.
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// Proof for `(recipient, token_id)`.
    ///
    /// # Errors
    /// `ProofNotFound` if the pair was not registered in this round.
    pub fn lookup(&self, recipient: &[u8; ADDRESS_LEN], token_id: U256) -> Result<&Proof> {
        let entry = Entry::new(*recipient, token_id);
        self.index
            .get(&entry)
            .map(|&position| &self.allocations[position].proof)
            .ok_or_else(|| AllowlistError::ProofNotFound {
                recipient: hex_encode(recipient),
                token_id: token_id.to_string(),
            })
    }

    /// All token ids registered for `recipient`, in registration order.
    pub fn token_ids_for(&self, recipient: &[u8; ADDRESS_LEN]) -> Vec<U256> {
        self.allocations
            .iter()
            .filter(|allocation| allocation.entry.recipient == *recipient)
            .map(|allocation| allocation.entry.token_id)
            .collect()
    }

    pub fn claim_package(&self, recipient: &[u8; ADDRESS_LEN], token_id: U256) -> Result<ClaimPackage> {
        let proof = self.lookup(recipient, token_id)?;
        Ok(ClaimPackage {
            merkle_root: hex_encode(self.root()),
            recipient: hex_encode(recipient),
            token_id: token_id.to_string(),
            proof: proof.to_hex(),
        })
    }

    /// Verifies every stored proof against the root.
    ///
    /// # Errors
    /// `ProofMismatch` for the first proof that fails.
    pub fn self_check(&self) -> Result<()> {
        let root = self.root();
        for allocation in &self.allocations {
            proof::ensure_valid(&allocation.proof.leaf, &allocation.proof.siblings, &root)?;
        }
        Ok(())
    }

    pub fn to_snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            round: self.round(),
            root: hex_encode(self.root()),
            leaf_count: self.len(),
            allocations: self
                .allocations
                .iter()
                .map(|allocation| AllocationRecord {
                    recipient: hex_encode(allocation.entry.recipient),
                    token_id: allocation.entry.token_id.to_string(),
                    leaf: hex_encode(allocation.proof.leaf),
                    proof: allocation.proof.to_hex(),
                })
                .collect(),
        }
    }

    /// Rebuilds a registry from a snapshot.
    ///
    /// The tree is recomputed from the recorded entries; stored leaves and
    /// proofs are not trusted.
    ///
    /// # Errors
    /// * `InvalidEntries` if recorded entries do not parse
    /// * `RootMismatch` if the recomputed root differs from the recorded one
    pub fn from_snapshot(snapshot: &RegistrySnapshot) -> Result<Self> {
        let expected = parse_hash(&snapshot.root)?;

        let mut entries = Vec::with_capacity(snapshot.allocations.len());
        let mut errors = Vec::new();
        for (index, record) in snapshot.allocations.iter().enumerate() {
            match Entry::parse(&record.recipient, &record.token_id) {
                Ok(entry) => entries.push(entry),
                Err(error) => errors.push(IndexedEntryError::at_entry(index, error)),
            }
        }
        if !errors.is_empty() {
            return Err(AllowlistError::InvalidEntries(errors));
        }

        let registry = Self::register(&entries, snapshot.round)?;
        let computed = registry.root();
        if computed != expected {
            return Err(AllowlistError::RootMismatch { expected, computed });
        }
        Ok(registry)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_snapshot())?;
        write_file_atomic(path, &json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: RegistrySnapshot = serde_json::from_str(&content)?;
        Self::from_snapshot(&snapshot)
    }
}

/// Serialized form of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub round: u64,
    pub root: String,
    pub leaf_count: usize,
    pub allocations: Vec<AllocationRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub recipient: String,
    pub token_id: String,
    pub leaf: String,
    pub proof: Vec<String>,
}
