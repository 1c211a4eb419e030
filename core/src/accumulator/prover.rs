use crate::accumulator::{
    hash_concat,
    incremental::{IncrementalMerkle, MerkleTreeError},
    merkle::{merkle_root_from_branch, Proof},
    TREE_DEPTH, ZERO_HASHES,
};
use crate::H256;

/// A depth-32 accumulator capable of proving inclusion of any past leaf.
///
/// Retains the full append-only leaf log as the source of truth for proof
/// generation; the incremental branch is kept alongside purely so the
/// current root stays O(depth) per insert. The log is what makes proofs for
/// arbitrary historical indices possible at all — the incremental state
/// alone cannot reconstruct sibling hashes below the leading edge.
#[derive(Debug, Clone, Default)]
pub struct Prover {
    leaves: Vec<H256>,
    incremental: IncrementalMerkle,
}

/// Prover errors
#[derive(Debug, thiserror::Error)]
pub enum ProverError {
    /// Requested proof for an index that holds no leaf yet
    #[error("Requested proof for unfilled index. Requested: {index}. Tree has: {count}")]
    ZeroProof {
        /// The index requested
        index: usize,
        /// The number of leaves
        count: usize,
    },
    /// Bubbled up from the underlying tree
    #[error(transparent)]
    MerkleTreeError(#[from] MerkleTreeError),
    /// Failed proof verification
    #[error("Proof verification failed. Root is {expected:?}, produced is {actual:?}")]
    VerificationFailed {
        /// The expected root (this tree's current root)
        expected: H256,
        /// The root produced by branch evaluation
        actual: H256,
    },
}

impl Prover {
    /// Push a leaf to the tree, returning the index it occupies.
    ///
    /// Fails once the underlying tree is full.
    pub fn ingest(&mut self, element: H256) -> Result<u32, ProverError> {
        let index = self.incremental.ingest(element)?;
        self.leaves.push(element);
        Ok(index)
    }

    /// Return the current root hash of the tree
    pub fn root(&self) -> H256 {
        self.incremental.root()
    }

    /// Return the number of leaves that have been ingested
    pub fn count(&self) -> usize {
        self.leaves.len()
    }

    /// The leaf stored at `index`, if filled.
    pub fn leaf(&self, index: usize) -> Option<H256> {
        self.leaves.get(index).copied()
    }

    /// Create a proof of the leaf at `index` against the current root.
    ///
    /// Siblings are recomputed from the leaf log, so any index ever filled
    /// can be proven — not just those on the leading edge. If the tree
    /// ingests more leaves the proof must be regenerated.
    pub fn prove(&self, index: usize) -> Result<Proof, ProverError> {
        let count = self.count();
        if index >= count {
            return Err(ProverError::ZeroProof { index, count });
        }

        let mut path = [H256::zero(); TREE_DEPTH];
        for (level, node) in path.iter_mut().enumerate() {
            // position of the sibling subtree at this level, and the span
            // of leaf indices it covers
            let sibling = (index >> level) ^ 1;
            let start = sibling << level;
            let end = count.min(start + (1 << level));
            let slice = if start < count {
                &self.leaves[start..end]
            } else {
                &[]
            };
            *node = subtree_root(slice, level);
        }

        Ok(Proof {
            leaf: self.leaves[index],
            index,
            path,
        })
    }

    /// Verify a proof against this tree's current root.
    pub fn verify(&self, proof: &Proof) -> Result<(), ProverError> {
        let actual = merkle_root_from_branch(proof.leaf, &proof.path, TREE_DEPTH, proof.index);
        let expected = self.root();
        if expected == actual {
            Ok(())
        } else {
            Err(ProverError::VerificationFailed { expected, actual })
        }
    }
}

/// Root of the subtree of the given depth whose leftmost leaves are `leaves`
/// and whose remaining slots are zero-filled.
fn subtree_root(leaves: &[H256], depth: usize) -> H256 {
    if leaves.is_empty() {
        return ZERO_HASHES[depth];
    }
    if depth == 0 {
        debug_assert_eq!(leaves.len(), 1);
        return leaves[0];
    }

    let capacity = 1usize << (depth - 1);
    let (left, right) = if leaves.len() <= capacity {
        (leaves, &[][..])
    } else {
        leaves.split_at(capacity)
    };
    hash_concat(subtree_root(left, depth - 1), subtree_root(right, depth - 1))
}

impl std::iter::FromIterator<H256> for Prover {
    /// Will panic if the tree fills
    fn from_iter<I: IntoIterator<Item = H256>>(iter: I) -> Self {
        let mut prover = Self::default();
        for leaf in iter {
            prover.ingest(leaf).expect("!tree full");
        }
        prover
    }
}
