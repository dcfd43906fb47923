//! # Error Taxonomy
//!
//! Every way a transition can fail, as one typed enum. The registry never
//! retries internally and never partially applies: any error below means the
//! store is exactly as it was before the call. Retry policy — most notably
//! recomputing a fresh asset nonce after [`RegistryError::AlreadyExists`] —
//! belongs to the caller.

use crate::address::Address;
use crate::crypto::PublicKey;
use thiserror::Error;

/// Errors produced by registry transitions.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The network singleton has already been created. First writer wins;
    /// everyone else gets this.
    #[error("network is already initialized")]
    AlreadyInitialized,

    /// The derived target address already holds a record. For asset
    /// creation this is the nonce-collision signal: recompute and retry.
    #[error("record already exists at {0}")]
    AlreadyExists(Address),

    /// The signer does not satisfy the authorization rule for the
    /// requested mutation.
    #[error("unauthorized: {reason}")]
    Unauthorized {
        /// Which rule was violated.
        reason: &'static str,
    },

    /// The guardian is already enrolled on this identity.
    #[error("guardian {0} is already enrolled")]
    DuplicateGuardian(PublicKey),

    /// The guardian list is at capacity.
    #[error("guardian limit reached: at most {max} recovery accounts")]
    GuardianLimitExceeded {
        /// The configured capacity.
        max: usize,
    },

    /// No record exists at the given address.
    #[error("no record at {0}")]
    NotFound(Address),

    /// The guardian to remove is not enrolled on this identity.
    #[error("guardian {0} is not enrolled")]
    GuardianNotFound(PublicKey),

    /// An input field failed validation (oversized metadata, malformed
    /// key bytes). The registry rejects — it never truncates or coerces.
    #[error("malformed input in {field}: {reason}")]
    MalformedInput {
        /// The offending field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Address derivation exhausted all 256 bump values without finding an
    /// off-curve digest. Statistically unreachable (probability ~2^-256),
    /// but the type system doesn't know that.
    #[error("address derivation exhausted the bump space")]
    AddressSearchExhausted,

    /// A record failed to encode or decode. Indicates store corruption or
    /// a serialization bug, not bad user input.
    #[error("codec failure: {detail}")]
    Codec {
        /// The underlying serializer message.
        detail: String,
    },
}

impl RegistryError {
    /// Convenience constructor for codec failures.
    pub(crate) fn codec(err: impl std::fmt::Display) -> Self {
        RegistryError::Codec {
            detail: err.to_string(),
        }
    }
}
