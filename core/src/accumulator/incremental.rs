use derive_new::new;

use crate::accumulator::{
    hash_concat,
    merkle::{merkle_root_from_branch, Proof},
    TREE_DEPTH, ZERO_HASHES,
};
use crate::H256;

/// Error types for the dispatch tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MerkleTreeError {
    /// No more space in the tree
    #[error("Merkle tree is full")]
    TreeFull,
}

/// An incremental merkle tree, modeled on the eth2 deposit contract.
///
/// Stores only the rightmost partial-subtree hash per level, so the root
/// stays computable in O(depth) state without retaining leaves.
#[derive(Debug, Clone, PartialEq, Eq, new, serde::Serialize, serde::Deserialize)]
pub struct IncrementalMerkle {
    /// The branch of the tree
    branch: [H256; TREE_DEPTH],
    /// The number of leaves in the tree
    count: usize,
}

impl Default for IncrementalMerkle {
    fn default() -> Self {
        Self {
            branch: [H256::zero(); TREE_DEPTH],
            count: 0,
        }
    }
}

impl IncrementalMerkle {
    /// Ingest a leaf into the tree, returning the index it was stored at.
    pub fn ingest(&mut self, element: H256) -> Result<u32, MerkleTreeError> {
        if self.count >= u32::MAX as usize {
            return Err(MerkleTreeError::TreeFull);
        }

        let index = self.count as u32;
        self.count += 1;

        let mut node = element;
        let mut size = self.count;
        for i in 0..TREE_DEPTH {
            if (size & 1) == 1 {
                self.branch[i] = node;
                return Ok(index);
            }
            node = hash_concat(self.branch[i], node);
            size /= 2;
        }
        unreachable!("tree is bounded by the count check above")
    }

    /// Calculate the current tree root
    pub fn root(&self) -> H256 {
        let mut node = H256::zero();
        let mut size = self.count;

        for (i, elem) in self.branch.iter().enumerate() {
            node = if (size & 1) == 1 {
                hash_concat(elem, node)
            } else {
                hash_concat(node, ZERO_HASHES[i])
            };
            size /= 2;
        }

        node
    }

    /// Get the number of items in the tree
    pub fn count(&self) -> usize {
        self.count
    }

    /// Index of the most recently inserted leaf. `None` while empty.
    pub fn index(&self) -> Option<u32> {
        self.count.checked_sub(1).map(|i| i as u32)
    }

    /// Get the leading-edge branch
    pub fn branch(&self) -> &[H256; TREE_DEPTH] {
        &self.branch
    }

    /// Verify a merkle proof of inclusion against this tree's current root
    pub fn verify(&self, proof: &Proof) -> bool {
        merkle_root_from_branch(proof.leaf, &proof.path, TREE_DEPTH, proof.index) == self.root()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_assigns_sequential_indices() {
        let mut tree = IncrementalMerkle::default();
        assert_eq!(tree.index(), None);
        for i in 0..5u32 {
            let index = tree.ingest(H256::from_low_u64_be(i as u64 + 1)).unwrap();
            assert_eq!(index, i);
        }
        assert_eq!(tree.count(), 5);
        assert_eq!(tree.index(), Some(4));
    }

    #[test]
    fn ingest_changes_the_root() {
        let mut tree = IncrementalMerkle::default();
        let r0 = tree.root();
        tree.ingest(H256::repeat_byte(0x01)).unwrap();
        let r1 = tree.root();
        tree.ingest(H256::repeat_byte(0x02)).unwrap();
        let r2 = tree.root();
        assert_ne!(r0, r1);
        assert_ne!(r1, r2);
    }

    #[test]
    fn root_is_a_function_of_the_leaf_sequence() {
        let leaves: Vec<_> = (1..=7u64).map(H256::from_low_u64_be).collect();

        let mut a = IncrementalMerkle::default();
        let mut b = IncrementalMerkle::default();
        for leaf in &leaves {
            a.ingest(*leaf).unwrap();
            b.ingest(*leaf).unwrap();
        }
        assert_eq!(a.root(), b.root());

        let mut c = IncrementalMerkle::default();
        for leaf in leaves.iter().rev() {
            c.ingest(*leaf).unwrap();
        }
        assert_ne!(a.root(), c.root());
    }
}
