//! # Fixed-Depth Merkle Tree
//!
//! A balanced binary Merkle tree of fixed depth used to commit each block's
//! transactions to the root chain. Only the root is published; a membership
//! proof lets an exit or challenge verifier check that one transaction is in
//! a block without seeing the others.
//!
//! ## Algorithm
//!
//! Domain-separated SHA-256:
//! - Leaf: `SHA256(0x00 || leaf_bytes)`.
//! - Node: `SHA256(0x01 || left || right)`.
//!
//! Slots past the last leaf hold per-level default hashes:
//! `zero[0] = [0; 32]`, `zero[l + 1] = node(zero[l], zero[l])`. The root of a
//! tree with no leaves is therefore `zero[depth]`, not an error.
//!
//! ## Proof Format
//!
//! A proof is the `depth` sibling hashes from the leaf level up to the level
//! below the root, concatenated into `32 * depth` bytes. The leaf index
//! selects the side at each level (`bit l` set means the sibling is on the
//! left), which is what a verifier with only byte slicing and integer
//! arithmetic needs.

use sha2::{Digest, Sha256};

use plasma_core::error::CryptoError;
use plasma_core::{CanonicalBytes, Digest32};

// ---------------------------------------------------------------------------
// Core hashing (domain-separated SHA-256)
// ---------------------------------------------------------------------------

/// Compute the leaf hash: `SHA256(0x00 || leaf_bytes)`.
pub fn leaf_hash(leaf: &CanonicalBytes) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update([0x00]);
    hasher.update(leaf.as_bytes());
    finish(hasher)
}

/// Compute a parent node hash: `SHA256(0x01 || left || right)`.
pub fn node_hash(left: &Digest32, right: &Digest32) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update([0x01]);
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    finish(hasher)
}

fn finish(hasher: Sha256) -> Digest32 {
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    Digest32(out)
}

/// Default hashes for empty subtrees, index `l` covering `2^l` leaves.
pub fn zero_hashes(depth: usize) -> Vec<Digest32> {
    let mut zeros = Vec::with_capacity(depth + 1);
    zeros.push(Digest32::ZERO);
    for l in 0..depth {
        let z = node_hash(&zeros[l], &zeros[l]);
        zeros.push(z);
    }
    zeros
}

// ---------------------------------------------------------------------------
// FixedMerkleTree
// ---------------------------------------------------------------------------

/// A fixed-depth Merkle tree over canonical leaf encodings.
///
/// Only populated nodes are stored; everything right of the last leaf is
/// implied by the zero hashes.
#[derive(Debug, Clone)]
pub struct FixedMerkleTree {
    depth: usize,
    /// `levels[0]` are leaf hashes, `levels[depth]` holds the root.
    levels: Vec<Vec<Digest32>>,
    zeros: Vec<Digest32>,
}

impl FixedMerkleTree {
    /// Build a tree of the given depth over `leaves`, in order.
    ///
    /// Fails if there are more leaves than `2^depth`.
    pub fn new(depth: usize, leaves: &[CanonicalBytes]) -> Result<Self, CryptoError> {
        if depth == 0 || depth >= usize::BITS as usize {
            return Err(CryptoError::Merkle(format!("unsupported depth {depth}")));
        }
        let capacity = 1usize << depth;
        if leaves.len() > capacity {
            return Err(CryptoError::Merkle(format!(
                "{} leaves exceed capacity {capacity}",
                leaves.len()
            )));
        }

        let zeros = zero_hashes(depth);
        let mut levels: Vec<Vec<Digest32>> = Vec::with_capacity(depth + 1);
        levels.push(leaves.iter().map(leaf_hash).collect());

        for l in 0..depth {
            let cur = &levels[l];
            let mut next = Vec::with_capacity((cur.len() + 1) / 2);
            for pair in cur.chunks(2) {
                let right = pair.get(1).unwrap_or(&zeros[l]);
                next.push(node_hash(&pair[0], right));
            }
            levels.push(next);
        }

        Ok(Self {
            depth,
            levels,
            zeros,
        })
    }

    /// Depth of the tree.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of leaves the tree was built over.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// The root hash.
    pub fn root(&self) -> Digest32 {
        self.levels[self.depth]
            .first()
            .copied()
            .unwrap_or(self.zeros[self.depth])
    }

    /// Build the membership proof for the leaf at `index`.
    pub fn membership_proof(&self, index: usize) -> Result<Vec<u8>, CryptoError> {
        if index >= self.leaf_count() {
            return Err(CryptoError::Merkle(format!(
                "leaf index {index} out of range ({} leaves)",
                self.leaf_count()
            )));
        }
        let mut proof = Vec::with_capacity(32 * self.depth);
        let mut pos = index;
        for l in 0..self.depth {
            let sibling = self.levels[l].get(pos ^ 1).unwrap_or(&self.zeros[l]);
            proof.extend_from_slice(sibling.as_bytes());
            pos /= 2;
        }
        Ok(proof)
    }
}

/// Verify that `leaf` sits at `index` under `root`.
///
/// Returns `false` for malformed proofs rather than an error.
pub fn verify_membership(
    root: &Digest32,
    leaf: &CanonicalBytes,
    index: usize,
    proof: &[u8],
) -> bool {
    if proof.is_empty() || proof.len() % 32 != 0 {
        return false;
    }
    let depth = proof.len() / 32;
    if depth < usize::BITS as usize && index >> depth != 0 {
        return false;
    }

    let mut cur = leaf_hash(leaf);
    let mut pos = index;
    for chunk in proof.chunks(32) {
        let mut sibling = [0u8; 32];
        sibling.copy_from_slice(chunk);
        let sibling = Digest32(sibling);
        cur = if pos & 1 == 1 {
            node_hash(&sibling, &cur)
        } else {
            node_hash(&cur, &sibling)
        };
        pos /= 2;
    }
    cur == *root
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasma_core::{Canonical, CanonicalWriter};

    struct Leaf(u64);

    impl Canonical for Leaf {
        fn write_canonical(&self, w: &mut CanonicalWriter) {
            w.put_u64(self.0);
        }
    }

    fn leaves(n: u64) -> Vec<CanonicalBytes> {
        (0..n).map(|i| CanonicalBytes::new(&Leaf(i))).collect()
    }

    #[test]
    fn empty_tree_has_zero_root() {
        let tree = FixedMerkleTree::new(16, &[]).unwrap();
        assert_eq!(tree.root(), zero_hashes(16)[16]);
        assert_ne!(tree.root(), Digest32::ZERO);
        assert!(tree.membership_proof(0).is_err());
    }

    #[test]
    fn single_leaf_root_folds_zero_siblings() {
        let l = leaves(1);
        let tree = FixedMerkleTree::new(2, &l).unwrap();
        let zeros = zero_hashes(2);
        let expected = node_hash(&node_hash(&leaf_hash(&l[0]), &zeros[0]), &zeros[1]);
        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn every_leaf_proves_against_root() {
        let l = leaves(5);
        let tree = FixedMerkleTree::new(16, &l).unwrap();
        for (i, leaf) in l.iter().enumerate() {
            let proof = tree.membership_proof(i).unwrap();
            assert_eq!(proof.len(), 16 * 32);
            assert!(verify_membership(&tree.root(), leaf, i, &proof));
        }
    }

    #[test]
    fn proof_fails_for_wrong_leaf_or_index() {
        let l = leaves(4);
        let tree = FixedMerkleTree::new(4, &l).unwrap();
        let proof = tree.membership_proof(1).unwrap();
        assert!(!verify_membership(&tree.root(), &l[2], 1, &proof));
        assert!(!verify_membership(&tree.root(), &l[1], 2, &proof));
        assert!(!verify_membership(&tree.root(), &l[1], 1, &proof[..32]));
        assert!(!verify_membership(&tree.root(), &l[1], 1, &[]));
    }

    #[test]
    fn capacity_enforced() {
        assert!(FixedMerkleTree::new(2, &leaves(4)).is_ok());
        assert!(FixedMerkleTree::new(2, &leaves(5)).is_err());
    }

    #[test]
    fn leaf_and_node_domains_differ() {
        struct TwoDigests(Digest32);
        impl Canonical for TwoDigests {
            fn write_canonical(&self, w: &mut CanonicalWriter) {
                w.put(&self.0);
                w.put(&self.0);
            }
        }
        let a = Digest32([1u8; 32]);
        let as_leaf = leaf_hash(&CanonicalBytes::new(&TwoDigests(a)));
        assert_ne!(as_leaf, node_hash(&a, &a));
    }
}
