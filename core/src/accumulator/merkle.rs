use crate::accumulator::{hash_concat, TREE_DEPTH};
use crate::H256;

/// A merkle proof object. The leaf, its path to the root, and its index in
/// the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Proof {
    /// The leaf
    pub leaf: H256,
    /// The index
    pub index: usize,
    /// The merkle branch, in bottom-up order
    pub path: [H256; TREE_DEPTH],
}

impl Proof {
    /// Calculate the merkle root produced by evaluating the proof
    pub fn root(&self) -> H256 {
        merkle_root_from_branch(self.leaf, &self.path, TREE_DEPTH, self.index)
    }
}

/// Compute a root hash from a leaf and a merkle branch.
///
/// Walks bottom-up; bit `i` of `index` selects whether the branch element at
/// level `i` sits to the left or the right of the running hash.
pub fn merkle_root_from_branch(leaf: H256, branch: &[H256], depth: usize, index: usize) -> H256 {
    assert_eq!(branch.len(), depth, "proof length should equal depth");

    let mut current = leaf;
    for (i, sibling) in branch.iter().enumerate() {
        if (index >> i) & 0x01 == 1 {
            current = hash_concat(sibling, current);
        } else {
            current = hash_concat(current, sibling);
        }
    }
    current
}

/// Verify a proof that `leaf` exists at `index` in a merkle tree rooted at
/// `root`. Pure; used both by the prover as a self-check and by the ISM as
/// independent verification of untrusted relayer input.
pub fn verify_merkle_proof(
    leaf: H256,
    branch: &[H256],
    depth: usize,
    index: usize,
    root: H256,
) -> bool {
    if branch.len() != depth {
        return false;
    }
    merkle_root_from_branch(leaf, branch, depth, index) == root
}
