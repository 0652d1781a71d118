//! Error types for the allow-list core.
//!
//! Per-entry problems are reported as [`EntryError`] and collected across a
//! whole batch before registration gives up, so an issuer sees every bad line
//! at once instead of fixing them one by one.

use std::fmt;

/// A problem with a single allocation entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("invalid token id: {0}")]
    InvalidTokenId(String),
}

/// Where a rejected entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPosition {
    /// Zero-based position in an in-memory batch.
    Entry(usize),
    /// One-based line number in an allocation file.
    Line(usize),
}

impl fmt::Display for EntryPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry(n) => write!(f, "entry {}", n),
            Self::Line(n) => write!(f, "line {}", n),
        }
    }
}

/// One rejected entry and where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedEntryError {
    pub position: EntryPosition,
    pub error: EntryError,
}

impl IndexedEntryError {
    pub fn at_entry(index: usize, error: EntryError) -> Self {
        Self {
            position: EntryPosition::Entry(index),
            error,
        }
    }

    pub fn at_line(line: usize, error: EntryError) -> Self {
        Self {
            position: EntryPosition::Line(line),
            error,
        }
    }
}

impl fmt::Display for IndexedEntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.error)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AllowlistError {
    #[error("{}", describe_entries(.0))]
    InvalidEntries(Vec<IndexedEntryError>),

    #[error("duplicate leaf 0x{}", hex::encode(.0))]
    DuplicateLeaf([u8; 32]),

    #[error("allocation list is empty")]
    EmptyAllocationList,

    #[error("leaf 0x{} is not part of the tree", hex::encode(.0))]
    LeafNotFound([u8; 32]),

    #[error("no proof registered for {recipient} / token {token_id}")]
    ProofNotFound { recipient: String, token_id: String },

    #[error("invalid proof format: {0}")]
    InvalidProofFormat(String),

    #[error("proof does not reconstruct root 0x{}", hex::encode(.0))]
    ProofMismatch([u8; 32]),

    #[error("root mismatch: expected 0x{}, computed 0x{}", hex::encode(.expected), hex::encode(.computed))]
    RootMismatch {
        expected: [u8; 32],
        computed: [u8; 32],
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn describe_entries(errors: &[IndexedEntryError]) -> String {
    let noun = if errors.len() == 1 { "entry" } else { "entries" };
    let details = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    format!("{} invalid {}: {}", errors.len(), noun, details)
}

pub type Result<T> = std::result::Result<T, AllowlistError>;
