use lazy_static::lazy_static;
use sha3::{digest::Update, Digest, Keccak256};

use crate::H256;

/// A lightweight incremental merkle, suitable for running on-ledger.
/// Stores O(depth) data.
pub mod incremental;
/// Proof objects and pure root-reconstruction functions.
pub mod merkle;
/// A full accumulator retaining the leaf log, able to prove any past index.
pub mod prover;

pub use prover::Prover;

/// Depth of the dispatch tree; capacity is 2^32 leaves.
pub const TREE_DEPTH: usize = 32;

pub(crate) fn hash_concat(left: impl AsRef<[u8]>, right: impl AsRef<[u8]>) -> H256 {
    H256::from_slice(
        Keccak256::new()
            .chain(left.as_ref())
            .chain(right.as_ref())
            .finalize()
            .as_slice(),
    )
}

lazy_static! {
    /// Roots of the all-zero subtree at each depth; `ZERO_HASHES[i]` is the
    /// root of a zero subtree containing 2^i leaves.
    pub static ref ZERO_HASHES: [H256; TREE_DEPTH + 1] = {
        let mut hashes = [H256::zero(); TREE_DEPTH + 1];
        for i in 0..TREE_DEPTH {
            hashes[i + 1] = hash_concat(hashes[i], hashes[i]);
        }
        hashes
    };
}
