use tree_hash::Hash256;

// Re-export SSZ traits to avoid users having to depend on these directly
pub use ssz::{Decode, DecodeError, Encode};

pub type H256 = Hash256;

/// Index of a validator in the registry.
pub type ValidatorIndex = u64;

/// Consensus epoch number.
pub type Epoch = u64;
