//! Asset registry operations: creation under an authority namespace and
//! ownership transfer.
//!
//! Nonce allocation lives on the registry side: [`Registry::create_asset`]
//! scans the authority's namespace for the lowest vacant nonce and returns
//! the assignment, so well-behaved callers never race each other on nonce
//! choice. The client-chosen variant is kept for callers that precompute —
//! its collision failure is deterministic (`AlreadyExists`), and the
//! caller contract is to recompute the authority's asset count and retry
//! with a fresh nonce, never to overwrite.

use crate::address::Address;
use crate::crypto::PublicKey;
use crate::error::RegistryError;
use crate::record::{Asset, Record};
use crate::registry::Registry;

impl Registry {
    /// Create an asset under `authority`'s namespace, allocating the
    /// lowest vacant nonce. Returns the asset address and the assigned
    /// nonce.
    ///
    /// Creation is open: any payer may name any key as authority. The
    /// payer becomes the initial owner.
    pub fn create_asset(
        &mut self,
        payer: &PublicKey,
        authority: &PublicKey,
        metadata_uri: String,
    ) -> Result<(Address, u64), RegistryError> {
        let (address, nonce) = self.next_vacant_nonce(authority)?;
        let asset = Asset::create(*authority, *payer, nonce, metadata_uri, self.now())?;
        self.store_mut().insert_new(address, &Record::Asset(asset))?;

        tracing::info!(%authority, owner = %payer, nonce, %address, "asset created");
        Ok((address, nonce))
    }

    /// Create an asset with a caller-computed nonce.
    ///
    /// The derived address is the uniqueness mechanism: for a fixed
    /// authority, two creations with the same nonce land on the same
    /// address and the second fails with [`RegistryError::AlreadyExists`].
    pub fn create_asset_with_nonce(
        &mut self,
        payer: &PublicKey,
        authority: &PublicKey,
        nonce: u64,
        metadata_uri: String,
    ) -> Result<Address, RegistryError> {
        let address = Address::asset(authority, nonce)?;
        let asset = Asset::create(*authority, *payer, nonce, metadata_uri, self.now())?;
        self.store_mut().insert_new(address, &Record::Asset(asset))?;

        tracing::info!(%authority, owner = %payer, nonce, %address, "asset created");
        Ok(address)
    }

    /// Transfer the asset at `asset_address` to `recipient`.
    ///
    /// Only the current owner may transfer. The recipient needs no
    /// on-registry record — any key is a valid owner.
    pub fn transfer_asset(
        &mut self,
        payer: &PublicKey,
        asset_address: &Address,
        recipient: PublicKey,
    ) -> Result<Address, RegistryError> {
        let mut asset = self
            .asset(asset_address)?
            .ok_or(RegistryError::NotFound(*asset_address))?;

        if asset.owner != *payer {
            return Err(RegistryError::Unauthorized {
                reason: "only the current owner may transfer an asset",
            });
        }

        asset.transfer(recipient);
        self.store_mut().put(*asset_address, &Record::Asset(asset))?;

        tracing::info!(from = %payer, to = %recipient, address = %asset_address, "asset transferred");
        Ok(*asset_address)
    }

    /// Find the lowest nonce whose derived address is vacant under
    /// `authority`.
    ///
    /// Linear in the authority's asset count, which is bounded by what the
    /// authority has actually paid to create.
    fn next_vacant_nonce(
        &self,
        authority: &PublicKey,
    ) -> Result<(Address, u64), RegistryError> {
        for nonce in 0u64.. {
            let address = Address::asset(authority, nonce)?;
            if !self.store().contains(&address) {
                return Ok((address, nonce));
            }
        }
        unreachable!("fewer than u64::MAX assets per authority")
    }
}
