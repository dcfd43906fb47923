//! # Persisted Record Types
//!
//! The three record types the registry stores, and their wire encoding.
//!
//! ## Encoding
//!
//! ```text
//! [ kind tag : 1 byte ][ primary key : 32 bytes ][ rest of body : bincode ]
//! ```
//!
//! The kind tag distinguishes record types sharing one address space. The
//! primary authorization key — network admin, identity owner, asset
//! authority — is always the *first* field of the body, so it sits at the
//! reserved offset `1..33` of every encoded record. External indexers can
//! range/filter by that key without decoding anything.
//!
//! ## Bounds
//!
//! Every variable-length field has an enforced maximum, checked on every
//! write. Unbounded record growth is a denial-of-service vector: storage
//! cost must be predictable at creation time. The registry rejects
//! oversized input outright — it never truncates.

use crate::crypto::PublicKey;
use crate::error::RegistryError;
use serde::{Deserialize, Serialize};

/// Maximum byte length of a metadata URI.
pub const MAX_URI_LENGTH: usize = 200;

/// Maximum byte length of a metadata digest / merkle root. Callers may
/// supply shorter digests (the visible client surface uses 16-byte ones);
/// anything above a 32-byte root is rejected.
pub const MAX_MERKLE_ROOT_LENGTH: usize = 32;

/// Maximum number of recovery accounts (guardians) per identity.
pub const MAX_RECOVERY_ACCOUNTS: usize = 8;

/// DID method prefix for identity records.
pub const DID_METHOD: &str = "did:crest";

/// Discriminator tag prefixed to every encoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RecordKind {
    /// The network configuration singleton.
    Network = 0x01,
    /// An identity record.
    Identity = 0x02,
    /// An asset record.
    Asset = 0x03,
}

impl RecordKind {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(RecordKind::Network),
            0x02 => Some(RecordKind::Identity),
            0x03 => Some(RecordKind::Asset),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// NetworkConfig
// ---------------------------------------------------------------------------

/// The network configuration singleton.
///
/// Exactly one instance exists for the whole registry, at the address
/// derived from the bare `Network` domain tag. The admin field is the
/// authorization anchor for privileged operations; it is set by the first
/// initializer and preserved from then on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// The admin key — whoever won the initialization race.
    pub admin: PublicKey,
    /// Running count of identities ever created on this network.
    pub total_identities: u64,
    /// Creation time, Unix seconds.
    pub created_at: i64,
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// An identity record — at most one per owner key, enforced by the
/// determinism of address derivation plus creation failing on an occupied
/// address.
///
/// The `owner` field is mutated by exactly one path: the recovery protocol.
/// Metadata updates never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The key that currently owns this identity.
    pub owner: PublicKey,
    /// Decentralized identifier string, `did:crest:<base58 owner key>`.
    /// Fixed at creation; survives recovery as the record's stable name.
    pub did: String,
    /// URI of the off-registry metadata document.
    pub metadata_uri: String,
    /// Digest / merkle root committing to the metadata content.
    pub metadata_merkle_root: Vec<u8>,
    /// Enrolled guardians, in insertion order. Order has no semantic
    /// effect on recovery — it only makes the record observable-stable.
    pub recovery_accounts: Vec<PublicKey>,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// Last update time, Unix seconds.
    pub updated_at: i64,
}

impl Identity {
    /// Build a fresh identity for `owner` with validated metadata and an
    /// empty guardian list.
    pub fn create(
        owner: PublicKey,
        metadata_uri: String,
        metadata_merkle_root: Vec<u8>,
        now: i64,
    ) -> Result<Self, RegistryError> {
        validate_metadata(&metadata_uri, &metadata_merkle_root)?;
        let did = format!("{}:{}", DID_METHOD, owner.to_base58());
        Ok(Self {
            owner,
            did,
            metadata_uri,
            metadata_merkle_root,
            recovery_accounts: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace both metadata fields atomically. Owner and guardians are
    /// untouched: metadata updates must never widen into ownership changes.
    pub fn update(
        &mut self,
        metadata_uri: String,
        metadata_merkle_root: Vec<u8>,
        now: i64,
    ) -> Result<(), RegistryError> {
        validate_metadata(&metadata_uri, &metadata_merkle_root)?;
        self.metadata_uri = metadata_uri;
        self.metadata_merkle_root = metadata_merkle_root;
        self.updated_at = now;
        Ok(())
    }

    /// Enroll a guardian.
    ///
    /// Fails on duplicates and once the capacity bound is reached. The
    /// caller has already checked that the requester owns this identity.
    pub fn add_recovery_account(&mut self, guardian: PublicKey) -> Result<(), RegistryError> {
        if self.recovery_accounts.contains(&guardian) {
            return Err(RegistryError::DuplicateGuardian(guardian));
        }
        if self.recovery_accounts.len() >= MAX_RECOVERY_ACCOUNTS {
            return Err(RegistryError::GuardianLimitExceeded {
                max: MAX_RECOVERY_ACCOUNTS,
            });
        }
        self.recovery_accounts.push(guardian);
        Ok(())
    }

    /// Unenroll a guardian. Removing an absent guardian is an error, not a
    /// no-op — a caller whose bookkeeping has drifted should hear about it.
    pub fn remove_recovery_account(&mut self, guardian: &PublicKey) -> Result<(), RegistryError> {
        let index = self
            .recovery_accounts
            .iter()
            .position(|g| g == guardian)
            .ok_or(RegistryError::GuardianNotFound(*guardian))?;
        self.recovery_accounts.remove(index);
        Ok(())
    }

    /// Execute ownership recovery by `signer`.
    ///
    /// The signer must be an enrolled guardian. On success the signer
    /// becomes the owner and the guardian set is cleared entirely:
    /// recovery revokes all prior trust, so no guardian enrolled under the
    /// old owner — the acting one included — can re-trigger recovery
    /// against the new owner.
    pub fn recover(&mut self, signer: &PublicKey, now: i64) -> Result<(), RegistryError> {
        if !self.recovery_accounts.contains(signer) {
            return Err(RegistryError::Unauthorized {
                reason: "signer is not an enrolled recovery account",
            });
        }
        self.owner = *signer;
        self.recovery_accounts.clear();
        self.updated_at = now;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// A transferable asset record.
///
/// The `(authority, nonce)` pair is the asset's permanent identity — it is
/// baked into the address and immutable after creation. Only `owner`
/// changes over the asset's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// The key under whose namespace this asset's nonce is scoped.
    /// Immutable. First field: this is the reserved-offset filter key.
    pub authority: PublicKey,
    /// The current owner. The only mutable field.
    pub owner: PublicKey,
    /// Sequence number, unique per authority. Immutable.
    pub nonce: u64,
    /// URI of the off-registry metadata document.
    pub metadata_uri: String,
    /// Creation time, Unix seconds.
    pub created_at: i64,
}

impl Asset {
    /// Build a fresh asset owned by `owner` under `authority`'s namespace.
    pub fn create(
        authority: PublicKey,
        owner: PublicKey,
        nonce: u64,
        metadata_uri: String,
        now: i64,
    ) -> Result<Self, RegistryError> {
        if metadata_uri.len() > MAX_URI_LENGTH {
            return Err(uri_too_long(metadata_uri.len()));
        }
        Ok(Self {
            authority,
            owner,
            nonce,
            metadata_uri,
            created_at: now,
        })
    }

    /// Hand ownership to `recipient`. Authority and nonce are immutable;
    /// the caller has already checked that the requester is the current
    /// owner.
    pub fn transfer(&mut self, recipient: PublicKey) {
        self.owner = recipient;
    }
}

// ---------------------------------------------------------------------------
// Record envelope
// ---------------------------------------------------------------------------

/// A record of any kind, as stored at an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    /// The network configuration singleton.
    Network(NetworkConfig),
    /// An identity record.
    Identity(Identity),
    /// An asset record.
    Asset(Asset),
}

impl Record {
    /// The discriminator tag for this record's kind.
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Network(_) => RecordKind::Network,
            Record::Identity(_) => RecordKind::Identity,
            Record::Asset(_) => RecordKind::Asset,
        }
    }

    /// The primary authorization key: admin, owner, or authority.
    pub fn primary_key(&self) -> &PublicKey {
        match self {
            Record::Network(n) => &n.admin,
            Record::Identity(i) => &i.owner,
            Record::Asset(a) => &a.authority,
        }
    }

    /// Encode to the tag-prefixed wire form.
    pub fn encode(&self) -> Result<Vec<u8>, RegistryError> {
        let body = match self {
            Record::Network(n) => bincode::serialize(n),
            Record::Identity(i) => bincode::serialize(i),
            Record::Asset(a) => bincode::serialize(a),
        }
        .map_err(RegistryError::codec)?;

        let mut bytes = Vec::with_capacity(1 + body.len());
        bytes.push(self.kind() as u8);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Decode from the tag-prefixed wire form.
    pub fn decode(bytes: &[u8]) -> Result<Self, RegistryError> {
        let (&tag, body) = bytes
            .split_first()
            .ok_or_else(|| RegistryError::codec("empty record bytes"))?;
        let kind = RecordKind::from_byte(tag)
            .ok_or_else(|| RegistryError::codec(format!("unknown record tag 0x{:02x}", tag)))?;

        match kind {
            RecordKind::Network => bincode::deserialize(body).map(Record::Network),
            RecordKind::Identity => bincode::deserialize(body).map(Record::Identity),
            RecordKind::Asset => bincode::deserialize(body).map(Record::Asset),
        }
        .map_err(RegistryError::codec)
    }
}

/// Validate identity metadata bounds. Shared by create and update.
fn validate_metadata(uri: &str, merkle_root: &[u8]) -> Result<(), RegistryError> {
    if uri.len() > MAX_URI_LENGTH {
        return Err(uri_too_long(uri.len()));
    }
    if merkle_root.len() > MAX_MERKLE_ROOT_LENGTH {
        return Err(RegistryError::MalformedInput {
            field: "metadata_merkle_root",
            reason: format!(
                "{} bytes exceeds the {}-byte maximum",
                merkle_root.len(),
                MAX_MERKLE_ROOT_LENGTH
            ),
        });
    }
    Ok(())
}

fn uri_too_long(len: usize) -> RegistryError {
    RegistryError::MalformedInput {
        field: "metadata_uri",
        reason: format!("{} bytes exceeds the {}-byte maximum", len, MAX_URI_LENGTH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    fn key(seed: u8) -> PublicKey {
        Keypair::from_seed(&[seed; 32]).public_key()
    }

    #[test]
    fn identity_create_sets_did_and_empty_guardians() {
        let owner = key(1);
        let identity =
            Identity::create(owner, "https://example.com".into(), vec![0xAB; 16], 1_000).unwrap();
        assert_eq!(identity.owner, owner);
        assert_eq!(identity.did, format!("did:crest:{}", owner.to_base58()));
        assert!(identity.recovery_accounts.is_empty());
        assert_eq!(identity.created_at, identity.updated_at);
    }

    #[test]
    fn oversized_uri_rejected() {
        let uri = "x".repeat(MAX_URI_LENGTH + 1);
        assert!(matches!(
            Identity::create(key(1), uri, vec![], 0),
            Err(RegistryError::MalformedInput { field: "metadata_uri", .. })
        ));
    }

    #[test]
    fn oversized_merkle_root_rejected() {
        assert!(matches!(
            Identity::create(key(1), "u".into(), vec![0; MAX_MERKLE_ROOT_LENGTH + 1], 0),
            Err(RegistryError::MalformedInput { field: "metadata_merkle_root", .. })
        ));
    }

    #[test]
    fn update_replaces_metadata_only() {
        let mut identity =
            Identity::create(key(1), "https://a".into(), vec![1; 16], 10).unwrap();
        identity.add_recovery_account(key(2)).unwrap();

        identity.update("https://b".into(), vec![2; 16], 20).unwrap();

        assert_eq!(identity.metadata_uri, "https://b");
        assert_eq!(identity.metadata_merkle_root, vec![2; 16]);
        assert_eq!(identity.owner, key(1));
        assert_eq!(identity.recovery_accounts, vec![key(2)]);
        assert_eq!(identity.created_at, 10);
        assert_eq!(identity.updated_at, 20);
    }

    #[test]
    fn duplicate_guardian_rejected_list_unchanged() {
        let mut identity = Identity::create(key(1), "u".into(), vec![], 0).unwrap();
        identity.add_recovery_account(key(2)).unwrap();

        let err = identity.add_recovery_account(key(2)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateGuardian(_)));
        assert_eq!(identity.recovery_accounts, vec![key(2)]);
    }

    #[test]
    fn guardian_capacity_enforced() {
        let mut identity = Identity::create(key(1), "u".into(), vec![], 0).unwrap();
        for seed in 0..MAX_RECOVERY_ACCOUNTS as u8 {
            identity.add_recovery_account(key(100 + seed)).unwrap();
        }
        assert!(matches!(
            identity.add_recovery_account(key(200)),
            Err(RegistryError::GuardianLimitExceeded { .. })
        ));
    }

    #[test]
    fn remove_absent_guardian_is_an_error() {
        let mut identity = Identity::create(key(1), "u".into(), vec![], 0).unwrap();
        assert!(matches!(
            identity.remove_recovery_account(&key(9)),
            Err(RegistryError::GuardianNotFound(_))
        ));
    }

    #[test]
    fn remove_preserves_insertion_order() {
        let mut identity = Identity::create(key(1), "u".into(), vec![], 0).unwrap();
        for seed in [10, 11, 12] {
            identity.add_recovery_account(key(seed)).unwrap();
        }
        identity.remove_recovery_account(&key(11)).unwrap();
        assert_eq!(identity.recovery_accounts, vec![key(10), key(12)]);
    }

    #[test]
    fn recover_transfers_ownership_and_clears_guardians() {
        let mut identity = Identity::create(key(1), "u".into(), vec![], 0).unwrap();
        identity.add_recovery_account(key(2)).unwrap();
        identity.add_recovery_account(key(3)).unwrap();

        identity.recover(&key(2), 50).unwrap();

        assert_eq!(identity.owner, key(2));
        assert!(identity.recovery_accounts.is_empty());
        assert_eq!(identity.updated_at, 50);
    }

    #[test]
    fn recover_by_non_guardian_rejected() {
        let mut identity = Identity::create(key(1), "u".into(), vec![], 0).unwrap();
        identity.add_recovery_account(key(2)).unwrap();

        let before = identity.clone();
        assert!(matches!(
            identity.recover(&key(9), 50),
            Err(RegistryError::Unauthorized { .. })
        ));
        assert_eq!(identity, before);
    }

    #[test]
    fn asset_transfer_changes_owner_only() {
        let mut asset = Asset::create(key(1), key(1), 7, "u".into(), 0).unwrap();
        asset.transfer(key(5));
        assert_eq!(asset.owner, key(5));
        assert_eq!(asset.authority, key(1));
        assert_eq!(asset.nonce, 7);
    }

    #[test]
    fn record_encoding_roundtrip_with_kind_tags() {
        let records = [
            Record::Network(NetworkConfig {
                admin: key(1),
                total_identities: 3,
                created_at: 99,
            }),
            Record::Identity(Identity::create(key(2), "https://x".into(), vec![7; 16], 1).unwrap()),
            Record::Asset(Asset::create(key(3), key(4), 0, "https://y".into(), 2).unwrap()),
        ];

        for record in &records {
            let bytes = record.encode().unwrap();
            assert_eq!(bytes[0], record.kind() as u8);
            let decoded = Record::decode(&bytes).unwrap();
            assert_eq!(&decoded, record);
        }
    }

    #[test]
    fn primary_key_sits_at_reserved_offset() {
        // Bytes 1..33 of every encoding are the primary authorization key,
        // readable without a full decode.
        let records = [
            Record::Network(NetworkConfig {
                admin: key(1),
                total_identities: 0,
                created_at: 0,
            }),
            Record::Identity(Identity::create(key(2), "u".into(), vec![], 0).unwrap()),
            Record::Asset(Asset::create(key(3), key(9), 4, "u".into(), 0).unwrap()),
        ];

        for record in &records {
            let bytes = record.encode().unwrap();
            assert_eq!(&bytes[1..33], record.primary_key().as_bytes());
        }
    }

    #[test]
    fn unknown_tag_rejected() {
        assert!(matches!(
            Record::decode(&[0x7F, 0, 0]),
            Err(RegistryError::Codec { .. })
        ));
        assert!(matches!(Record::decode(&[]), Err(RegistryError::Codec { .. })));
    }
}
