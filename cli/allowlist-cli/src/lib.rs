#![forbid(unsafe_code)]

pub mod allocation;
pub mod common;
pub mod error;
pub mod leaf;
pub mod proof;
pub mod registry;
pub mod tree;

pub use common::{
    hash_sorted_pair, hex_encode, keccak256, parse_address, parse_hash, write_file_atomic,
    EMPTY_ROOT,
};
pub use error::{AllowlistError, EntryError, EntryPosition, IndexedEntryError};
pub use leaf::{parse_token_id, Entry, LeafEncoder, PackedKeccakEncoder};
pub use proof::{generate, verify, verify_hex, Proof};
pub use registry::{AllocationRegistry, ClaimPackage, RegistrySnapshot};
pub use tree::MerkleTree;
