//! # Cryptographic Primitives for CREST
//!
//! Everything security-related in the registry flows through here: the keys
//! that own records and the hashes that derive addresses and state roots.
//!
//! We deliberately chose boring, well-audited cryptography:
//!
//! - **Ed25519** for signatures — fast, deterministic, and nobody has
//!   broken it.
//! - **BLAKE3** for hashing — because we live in the future.
//!
//! Nothing in this module is novel, and that is the point. If you're
//! tempted to optimize these functions, please reconsider. Then go read
//! about timing attacks and come back when you've lost the urge.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, blake3_hash_multi, domain_separated_hash, merkle_root};
pub use keys::{KeyError, Keypair, PublicKey, Signature};
