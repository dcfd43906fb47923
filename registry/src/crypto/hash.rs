//! # Hashing Utilities
//!
//! BLAKE3 and nothing else. The registry has no cross-chain compatibility
//! obligations, so there is no reason to carry a second hash function —
//! BLAKE3 is fast on every platform that matters and its `derive_key` mode
//! gives us proper domain separation for free.

/// Compute the BLAKE3 hash of the input data.
///
/// Returns a 32-byte digest as a fixed-size array. This is the workhorse
/// hash function of the registry — record leaves, state roots, and signing
/// digests all come through here.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Hash multiple byte slices together without concatenation overhead.
///
/// Instead of allocating a buffer to concatenate inputs, we feed them
/// sequentially into the hasher. Same result, less allocation.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Compute a domain-separated hash using BLAKE3 with a context string.
///
/// Domain separation prevents hash collisions across protocol contexts:
/// `domain_separated_hash("address", data)` and
/// `domain_separated_hash("transition", data)` never collide even for equal
/// `data`. This uses BLAKE3's built-in `derive_key` mode, which derives a
/// distinct internal IV from the context string — don't try to prepend a
/// tag manually.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Compute a binary Merkle root from a list of leaf hashes.
///
/// A plain binary tree: odd levels duplicate their last node, a single leaf
/// is paired with itself so the root is always the output of a hash
/// operation, and an empty input returns the all-zero sentinel. Leaf
/// uniqueness is the caller's problem — the store guarantees it by keying
/// leaves on unique addresses.
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut current_level: Vec<[u8; 32]> = leaves.to_vec();

    if current_level.len() == 1 {
        return blake3_hash_multi(&[current_level[0].as_slice(), current_level[0].as_slice()]);
    }

    while current_level.len() > 1 {
        let mut next_level = Vec::with_capacity((current_level.len() + 1) / 2);

        for chunk in current_level.chunks(2) {
            let left = &chunk[0];
            let right = if chunk.len() == 2 { &chunk[1] } else { &chunk[0] };
            next_level.push(blake3_hash_multi(&[left.as_slice(), right.as_slice()]));
        }

        current_level = next_level;
    }

    current_level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake3_deterministic() {
        let a = blake3_hash(b"crest");
        let b = blake3_hash(b"crest");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn multi_matches_concatenation() {
        let multi = blake3_hash_multi(&[b"hello", b" world"]);
        let single = blake3_hash(b"hello world");
        assert_eq!(multi, single);
    }

    #[test]
    fn domain_separation_changes_output() {
        let data = b"same data";
        let a = domain_separated_hash("context-a", data);
        let b = domain_separated_hash("context-b", data);
        assert_ne!(a, b);
        assert_ne!(a, blake3_hash(data));
    }

    #[test]
    fn merkle_root_empty_is_zero() {
        assert_eq!(merkle_root(&[]), [0u8; 32]);
    }

    #[test]
    fn merkle_root_single_leaf_pairs_with_itself() {
        let leaf = blake3_hash(b"only child");
        let expected = blake3_hash_multi(&[leaf.as_slice(), leaf.as_slice()]);
        assert_eq!(merkle_root(&[leaf]), expected);
    }

    #[test]
    fn merkle_root_order_matters() {
        let a = blake3_hash(b"first");
        let b = blake3_hash(b"second");
        assert_ne!(merkle_root(&[a, b]), merkle_root(&[b, a]));
    }
}
