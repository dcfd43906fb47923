//! # The Registry State Machine
//!
//! Ties the pieces together: a [`Registry`] owns a [`RecordStore`] and
//! implements every transition as a single atomic validate-then-mutate
//! step. The host's serialization guarantee (never two transitions applied
//! to the same record concurrently) appears here as plain `&mut self`
//! exclusivity.
//!
//! Operations are grouped the way the protocol is:
//!
//! - `network`  — the admin-anchored configuration singleton
//! - `identity` — identity creation and metadata updates
//! - `recovery` — guardian enrollment and ownership recovery
//! - `asset`    — asset creation and transfer
//!
//! Each operation validates authorization and invariants against the
//! current store, and only then writes. There is no partial application:
//! any error leaves every record byte-for-byte unchanged, and there is no
//! internal retry — recomputing a fresh asset nonce after a collision is
//! the caller's contract.

mod asset;
mod identity;
mod network;
mod recovery;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::RegistryError;
use crate::record::{Asset, Identity, NetworkConfig, Record};
use crate::store::RecordStore;
use crate::transition::{SignedTransition, Transition};

/// The outcome of a successfully applied transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// The address of the record that was created or mutated.
    pub address: Address,
    /// The nonce the registry allocated, for asset creation only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_nonce: Option<u64>,
}

impl Receipt {
    fn for_address(address: Address) -> Self {
        Self {
            address,
            asset_nonce: None,
        }
    }
}

/// The identity and asset registry.
///
/// All mutation goes through [`apply`](Self::apply) (signature-checked) or
/// the typed operation methods it dispatches to; all reads go through the
/// fetch methods at the bottom of this impl.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    store: RecordStore,
}

impl Registry {
    /// Create a registry over an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only access to the underlying store.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Verify and apply a signed transition.
    ///
    /// The signature is checked before anything else; a transition that
    /// does not verify is `Unauthorized` regardless of its payload.
    pub fn apply(&mut self, signed: &SignedTransition) -> Result<Receipt, RegistryError> {
        if !signed.verify() {
            return Err(RegistryError::Unauthorized {
                reason: "transition signature does not verify",
            });
        }

        let signer = signed.signer;
        match &signed.transition {
            Transition::InitializeNetwork => {
                self.initialize_network(&signer).map(Receipt::for_address)
            }
            Transition::CreateIdentity {
                metadata_uri,
                metadata_merkle_root,
            } => self
                .create_identity(&signer, metadata_uri.clone(), metadata_merkle_root.clone())
                .map(Receipt::for_address),
            Transition::UpdateIdentity {
                metadata_uri,
                metadata_merkle_root,
            } => self
                .update_identity(&signer, metadata_uri.clone(), metadata_merkle_root.clone())
                .map(Receipt::for_address),
            Transition::AddRecoveryAccount { guardian } => self
                .add_recovery_account(&signer, *guardian)
                .map(Receipt::for_address),
            Transition::RemoveRecoveryAccount { guardian } => self
                .remove_recovery_account(&signer, guardian)
                .map(Receipt::for_address),
            Transition::Recover { identity } => {
                self.recover(&signer, identity).map(Receipt::for_address)
            }
            Transition::CreateAsset {
                authority,
                metadata_uri,
            } => self
                .create_asset(&signer, authority, metadata_uri.clone())
                .map(|(address, nonce)| Receipt {
                    address,
                    asset_nonce: Some(nonce),
                }),
            Transition::CreateAssetWithNonce {
                authority,
                nonce,
                metadata_uri,
            } => self
                .create_asset_with_nonce(&signer, authority, *nonce, metadata_uri.clone())
                .map(|address| Receipt {
                    address,
                    asset_nonce: Some(*nonce),
                }),
            Transition::TransferAsset { asset, recipient } => self
                .transfer_asset(&signer, asset, *recipient)
                .map(Receipt::for_address),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Fetch the network configuration, if initialized.
    pub fn network(&self) -> Result<Option<NetworkConfig>, RegistryError> {
        match self.store.get(&Address::network()?)? {
            Some(Record::Network(config)) => Ok(Some(config)),
            Some(_) => Err(RegistryError::codec("network address holds a non-network record")),
            None => Ok(None),
        }
    }

    /// Fetch the identity owned by a key (at its derived address), if any.
    pub fn identity(
        &self,
        owner: &crate::crypto::PublicKey,
    ) -> Result<Option<Identity>, RegistryError> {
        self.identity_at(&Address::identity(owner)?)
    }

    /// Fetch the identity at an explicit address, if any.
    ///
    /// Needed by guardians, who know the identity's address but not
    /// necessarily its current owner.
    pub fn identity_at(&self, address: &Address) -> Result<Option<Identity>, RegistryError> {
        match self.store.get(address)? {
            Some(Record::Identity(identity)) => Ok(Some(identity)),
            _ => Ok(None),
        }
    }

    /// Fetch the asset at an address, if any.
    pub fn asset(&self, address: &Address) -> Result<Option<Asset>, RegistryError> {
        match self.store.get(address)? {
            Some(Record::Asset(asset)) => Ok(Some(asset)),
            _ => Ok(None),
        }
    }

    /// All assets in an authority's namespace, sorted by nonce.
    ///
    /// Filters on the reserved primary-key offset first, so non-matching
    /// records are skipped without a decode.
    pub fn assets_by_authority(
        &self,
        authority: &crate::crypto::PublicKey,
    ) -> Result<Vec<Asset>, RegistryError> {
        let mut assets = Vec::new();
        for (_, bytes) in self.store.iter() {
            if RecordStore::primary_key_bytes(bytes) != Some(authority.as_bytes().as_slice()) {
                continue;
            }
            if let Record::Asset(asset) = Record::decode(bytes)? {
                assets.push(asset);
            }
        }
        assets.sort_by_key(|a| a.nonce);
        Ok(assets)
    }

    /// Number of records in the registry.
    pub fn record_count(&self) -> usize {
        self.store.len()
    }

    /// The deterministic state root over all records.
    pub fn root_hash(&self) -> [u8; 32] {
        self.store.root_hash()
    }

    // -----------------------------------------------------------------------
    // Internals shared by the operation modules
    // -----------------------------------------------------------------------

    pub(crate) fn store_mut(&mut self) -> &mut RecordStore {
        &mut self.store
    }

    /// Current time in Unix seconds, stamped into created/updated fields.
    pub(crate) fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    #[test]
    fn apply_rejects_bad_signature() {
        let mut registry = Registry::new();
        let kp = Keypair::from_seed(&[1u8; 32]);
        let other = Keypair::from_seed(&[2u8; 32]);

        let mut signed = SignedTransition::sign(Transition::InitializeNetwork, &kp).unwrap();
        signed.signer = other.public_key();

        assert!(matches!(
            registry.apply(&signed),
            Err(RegistryError::Unauthorized { .. })
        ));
        assert_eq!(registry.record_count(), 0);
    }

    #[test]
    fn apply_dispatches_and_reports_addresses() {
        let mut registry = Registry::new();
        let admin = Keypair::from_seed(&[1u8; 32]);

        let receipt = registry
            .apply(&SignedTransition::sign(Transition::InitializeNetwork, &admin).unwrap())
            .unwrap();
        assert_eq!(receipt.address, Address::network().unwrap());
        assert_eq!(receipt.asset_nonce, None);

        let receipt = registry
            .apply(
                &SignedTransition::sign(
                    Transition::CreateAsset {
                        authority: admin.public_key(),
                        metadata_uri: "https://example.com/a".into(),
                    },
                    &admin,
                )
                .unwrap(),
            )
            .unwrap();
        assert_eq!(receipt.asset_nonce, Some(0));
        assert_eq!(
            receipt.address,
            Address::asset(&admin.public_key(), 0).unwrap()
        );
    }
}
