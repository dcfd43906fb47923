//! # Derived Addresses
//!
//! Every record in CREST lives at an address computed from what the record
//! *is*, not from where somebody happened to put it:
//!
//! ```text
//! derive(tag, components)
//!     -> BLAKE3_derive_key("crest address derivation v1",
//!            tag || len(c0) || c0 || len(c1) || c1 || ... || bump)
//!     -> first digest that is NOT a valid Ed25519 point
//! ```
//!
//! The derivation is a pure function: the same inputs yield the same
//! address in every process, forever. Writers use it to know where to
//! create a record; validators re-derive it to refuse operations whose
//! target does not match — the defence against address-confusion attacks.
//!
//! ## Why the off-curve search?
//!
//! Derived addresses share a 32-byte space with user public keys. By
//! bumping a trailing byte until the digest fails Ed25519 point
//! decompression, a derived address can never equal a key anyone could
//! hold, so no signature can ever claim a derived record directly. Each
//! bump fails with probability ~1/2, so the search terminates after a
//! couple of iterations in practice and the 256-bump exhaustion error is
//! unreachable outside of adversarial thought experiments.
//!
//! Addresses display as Bech32 with the `crest` HRP — checksummed and
//! hard to fat-finger.

use crate::crypto::PublicKey;
use crate::error::RegistryError;
use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The human-readable prefix for all CREST addresses.
const CREST_HRP: &str = "crest";

/// BLAKE3 derive-key context for address derivation. Versioned: changing
/// this relocates every record, so it never changes within a deployment.
const DERIVATION_CONTEXT: &str = "crest address derivation v1";

/// Errors from parsing address strings.
#[derive(Debug, Error)]
pub enum AddressParseError {
    /// The Bech32 string could not be decoded.
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The decoded address has an unexpected human-readable prefix.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp {
        /// The expected HRP.
        expected: String,
        /// The HRP that was actually found.
        got: String,
    },

    /// The decoded data has an unexpected length.
    #[error("invalid address data length: expected 32 bytes, got {0}")]
    InvalidDataLength(usize),
}

/// A record category's address space within the derivation function.
///
/// One byte, mixed into the derivation preimage ahead of all components, so
/// the three record namespaces can never collide even on identical
/// component bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DomainTag {
    /// The network configuration singleton. No owner component.
    Network = 0x01,
    /// Identity records, one per owner key.
    Identity = 0x02,
    /// Asset records, scoped by (authority, nonce).
    Asset = 0x03,
}

impl DomainTag {
    /// The tag byte mixed into the derivation preimage.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A derived 32-byte account address.
///
/// Guaranteed off-curve by construction (see module docs), so it can never
/// collide with a user-held public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    bytes: [u8; 32],
}

impl Address {
    /// Derive the address for a record category and its components.
    ///
    /// Components are length-prefixed (u16 little-endian) before hashing,
    /// so `["ab", "c"]` and `["a", "bc"]` derive different addresses —
    /// concatenation ambiguity is a collision, and collisions are how
    /// registries get robbed.
    ///
    /// # Errors
    ///
    /// [`RegistryError::AddressSearchExhausted`] if all 256 bump values
    /// produce on-curve digests (probability ~2^-256), and
    /// [`RegistryError::MalformedInput`] for a component longer than a u16
    /// can prefix.
    pub fn derive(tag: DomainTag, components: &[&[u8]]) -> Result<Self, RegistryError> {
        let mut preimage = Vec::with_capacity(64);
        preimage.push(tag.as_byte());
        for component in components {
            let len = u16::try_from(component.len()).map_err(|_| RegistryError::MalformedInput {
                field: "derivation component",
                reason: format!("component of {} bytes exceeds u16 length prefix", component.len()),
            })?;
            preimage.extend_from_slice(&len.to_le_bytes());
            preimage.extend_from_slice(component);
        }

        let base_len = preimage.len();
        for bump in 0u8..=255 {
            preimage.truncate(base_len);
            preimage.push(bump);

            let digest = crate::crypto::domain_separated_hash(DERIVATION_CONTEXT, &preimage);
            if !PublicKey::is_curve_point(&digest) {
                return Ok(Self { bytes: digest });
            }
        }

        Err(RegistryError::AddressSearchExhausted)
    }

    /// The address of the network configuration singleton.
    pub fn network() -> Result<Self, RegistryError> {
        Self::derive(DomainTag::Network, &[])
    }

    /// The identity address for an owner key.
    pub fn identity(owner: &PublicKey) -> Result<Self, RegistryError> {
        Self::derive(DomainTag::Identity, &[owner.as_bytes()])
    }

    /// The asset address for an (authority, nonce) pair.
    pub fn asset(authority: &PublicKey, nonce: u64) -> Result<Self, RegistryError> {
        Self::derive(
            DomainTag::Asset,
            &[authority.as_bytes(), &nonce.to_le_bytes()],
        )
    }

    /// The raw 32 address bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Construct from raw bytes. No off-curve check: the caller is trusted
    /// to hold bytes that came out of [`derive`](Self::derive) or a parsed
    /// address string.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Encode this address as a Bech32 string (`crest1...`).
    pub fn to_bech32(&self) -> String {
        let hrp = Hrp::parse(CREST_HRP).expect("static HRP is valid");
        bech32::encode::<Bech32>(hrp, &self.bytes)
            .expect("encoding a 32-byte payload should never fail")
    }

    /// Parse a Bech32-encoded CREST address.
    ///
    /// Validates the HRP, checksum, and data length.
    pub fn from_bech32(addr: &str) -> Result<Self, AddressParseError> {
        let (hrp, data) =
            bech32::decode(addr).map_err(|e| AddressParseError::Bech32Decode(e.to_string()))?;

        let expected_hrp = Hrp::parse(CREST_HRP).expect("static HRP is valid");
        if hrp != expected_hrp {
            return Err(AddressParseError::InvalidHrp {
                expected: CREST_HRP.to_string(),
                got: hrp.to_string(),
            });
        }

        if data.len() != 32 {
            return Err(AddressParseError::InvalidDataLength(data.len()));
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&data);
        Ok(Self { bytes })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bech32())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_bech32())
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_bech32())
        } else {
            self.bytes.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::from_bech32(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <[u8; 32]>::deserialize(deserializer)?;
            Ok(Address { bytes })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    #[test]
    fn derivation_is_deterministic() {
        let owner = Keypair::from_seed(&[7u8; 32]).public_key();
        let a = Address::identity(&owner).unwrap();
        let b = Address::identity(&owner).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_owners_different_addresses() {
        let a = Address::identity(&Keypair::from_seed(&[1u8; 32]).public_key()).unwrap();
        let b = Address::identity(&Keypair::from_seed(&[2u8; 32]).public_key()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn domain_tags_separate_namespaces() {
        let key = Keypair::from_seed(&[9u8; 32]).public_key();
        let identity = Address::derive(DomainTag::Identity, &[key.as_bytes()]).unwrap();
        let asset = Address::derive(DomainTag::Asset, &[key.as_bytes()]).unwrap();
        assert_ne!(identity, asset);
    }

    #[test]
    fn length_prefix_prevents_concatenation_ambiguity() {
        let a = Address::derive(DomainTag::Asset, &[b"ab", b"c"]).unwrap();
        let b = Address::derive(DomainTag::Asset, &[b"a", b"bc"]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn nonces_separate_asset_addresses() {
        let authority = Keypair::from_seed(&[3u8; 32]).public_key();
        let a0 = Address::asset(&authority, 0).unwrap();
        let a1 = Address::asset(&authority, 1).unwrap();
        assert_ne!(a0, a1);
    }

    #[test]
    fn derived_addresses_are_off_curve() {
        let owner = Keypair::from_seed(&[5u8; 32]).public_key();
        for addr in [
            Address::network().unwrap(),
            Address::identity(&owner).unwrap(),
            Address::asset(&owner, 42).unwrap(),
        ] {
            assert!(!crate::crypto::PublicKey::is_curve_point(addr.as_bytes()));
        }
    }

    #[test]
    fn bech32_roundtrip() {
        let addr = Address::network().unwrap();
        let encoded = addr.to_bech32();
        assert!(encoded.starts_with("crest1"), "address was: {}", encoded);
        let recovered = Address::from_bech32(&encoded).unwrap();
        assert_eq!(addr, recovered);
    }

    #[test]
    fn wrong_hrp_rejected() {
        let hrp = Hrp::parse("other").unwrap();
        let encoded = bech32::encode::<Bech32>(hrp, &[0u8; 32]).unwrap();
        assert!(matches!(
            Address::from_bech32(&encoded),
            Err(AddressParseError::InvalidHrp { .. })
        ));
    }

    #[test]
    fn corrupted_address_rejected() {
        let mut addr = Address::network().unwrap().to_bech32();
        let mid = addr.len() / 2;
        let original = addr.as_bytes()[mid];
        let replacement = if original == b'q' { b'p' } else { b'q' };
        unsafe {
            addr.as_bytes_mut()[mid] = replacement;
        }
        assert!(Address::from_bech32(&addr).is_err());
    }

    #[test]
    fn oversized_component_rejected() {
        let huge = vec![0u8; usize::from(u16::MAX) + 1];
        assert!(matches!(
            Address::derive(DomainTag::Asset, &[&huge]),
            Err(RegistryError::MalformedInput { .. })
        ));
    }

    #[test]
    fn serde_json_uses_bech32() {
        let addr = Address::network().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_bech32()));
        let decoded: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, decoded);
    }

    #[test]
    fn binary_serde_is_raw_bytes() {
        let addr = Address::network().unwrap();
        let encoded = bincode::serialize(&addr).unwrap();
        assert_eq!(encoded.len(), 32);
        let decoded: Address = bincode::deserialize(&encoded).unwrap();
        assert_eq!(addr, decoded);
    }
}
