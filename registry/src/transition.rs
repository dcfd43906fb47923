//! # Signed Transitions
//!
//! The request surface clients submit to the registry. A transition names
//! an operation and its inputs; a [`SignedTransition`] wraps it with the
//! signer's public key and an Ed25519 signature over the canonical digest.
//!
//! There is no ambient trust in this system: the signature is the only
//! thing that makes a request "from" anyone, and [`crate::Registry::apply`]
//! refuses anything that doesn't verify before looking at the payload.
//!
//! ## Canonical signing bytes
//!
//! The digest is a domain-separated BLAKE3 hash of the bincode encoding of
//! the transition. Domain separation keeps transition signatures from ever
//! being valid in another protocol context (or vice versa), and the binary
//! encoding is canonical — there is exactly one byte string per transition
//! value.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::crypto::{domain_separated_hash, Keypair, PublicKey, Signature};
use crate::error::RegistryError;

/// BLAKE3 derive-key context for transition signing digests.
const SIGNING_CONTEXT: &str = "crest transition v1";

/// One requested state transition.
///
/// The signer of the enclosing [`SignedTransition`] plays the role the
/// operation's authorization rule names: payer for creation and updates,
/// guardian for `Recover`, current owner for `TransferAsset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Transition {
    /// Create the network configuration singleton. First writer wins and
    /// becomes admin.
    InitializeNetwork,

    /// Self-register an identity for the signer.
    CreateIdentity {
        /// URI of the off-registry metadata document.
        metadata_uri: String,
        /// Digest committing to the metadata content (≤ 32 bytes).
        metadata_merkle_root: Vec<u8>,
    },

    /// Replace the signer's identity metadata.
    UpdateIdentity {
        /// New metadata URI.
        metadata_uri: String,
        /// New metadata digest.
        metadata_merkle_root: Vec<u8>,
    },

    /// Enroll a guardian on the signer's identity.
    AddRecoveryAccount {
        /// The guardian key to enroll.
        guardian: PublicKey,
    },

    /// Unenroll a guardian from the signer's identity.
    RemoveRecoveryAccount {
        /// The guardian key to remove.
        guardian: PublicKey,
    },

    /// Take ownership of an identity as one of its guardians. The target
    /// identity is named by address because the guardian does not know the
    /// current owner key a priori.
    Recover {
        /// Address of the identity to recover.
        identity: Address,
    },

    /// Create an asset under an authority's namespace. The registry
    /// allocates the nonce and reports it in the receipt.
    CreateAsset {
        /// The namespace authority (the visible surface always uses the
        /// signer itself, but any key is a valid authority).
        authority: PublicKey,
        /// Metadata URI for the asset.
        metadata_uri: String,
    },

    /// Create an asset with a caller-computed nonce. Collides
    /// deterministically: callers must recompute and retry on
    /// `AlreadyExists`.
    CreateAssetWithNonce {
        /// The namespace authority.
        authority: PublicKey,
        /// Caller-chosen sequence number.
        nonce: u64,
        /// Metadata URI for the asset.
        metadata_uri: String,
    },

    /// Transfer an asset to a recipient key.
    TransferAsset {
        /// Address of the asset record.
        asset: Address,
        /// The new owner.
        recipient: PublicKey,
    },
}

impl Transition {
    /// The canonical 32-byte digest this transition is signed over.
    pub fn signing_digest(&self) -> Result<[u8; 32], RegistryError> {
        let encoded = bincode::serialize(self).map_err(RegistryError::codec)?;
        Ok(domain_separated_hash(SIGNING_CONTEXT, &encoded))
    }
}

/// A transition plus the signer's key and signature over the canonical
/// digest — the unprivileged, externally-supplied input the registry
/// validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransition {
    /// The requested operation.
    pub transition: Transition,
    /// Who claims to request it.
    pub signer: PublicKey,
    /// Ed25519 signature by `signer` over the transition digest.
    pub signature: Signature,
}

impl SignedTransition {
    /// Sign a transition with a keypair.
    pub fn sign(transition: Transition, keypair: &Keypair) -> Result<Self, RegistryError> {
        let digest = transition.signing_digest()?;
        Ok(Self {
            transition,
            signer: keypair.public_key(),
            signature: keypair.sign(&digest),
        })
    }

    /// Verify the signature against the embedded signer key.
    pub fn verify(&self) -> bool {
        match self.transition.signing_digest() {
            Ok(digest) => self.signer.verify(&digest, &self.signature),
            Err(_) => false,
        }
    }
}
