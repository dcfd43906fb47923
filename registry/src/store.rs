//! # Record Store — Host Ledger Stand-In
//!
//! The registry's view of the host ledger: a flat map from derived address
//! to encoded record bytes. The real persistence substrate (consensus,
//! rent, durable storage) is supplied by the host platform and out of
//! scope here; what this type models is the *semantics* the registry relies
//! on — one record per address, insert-if-vacant, and serialized
//! application of transitions to any given address.
//!
//! Records are held in encoded form. That keeps "failed transitions leave
//! state byte-for-byte unchanged" an observable property rather than a
//! promise, and makes the state root a function of exactly what is stored.
//!
//! ## State root
//!
//! ```text
//! leaves = sort_by_address([ BLAKE3(addr || record_bytes) ])
//! root   = merkle_root(leaves)
//! ```
//!
//! Sorting makes the root deterministic regardless of insertion order.

use std::collections::{BTreeMap, HashMap};

use crate::address::Address;
use crate::crypto::hash::{blake3_hash_multi, merkle_root};
use crate::error::RegistryError;
use crate::record::Record;

/// Offset of the primary authorization key within an encoded record:
/// 1 byte of kind tag, then 32 key bytes.
const PRIMARY_KEY_RANGE: std::ops::Range<usize> = 1..33;

/// Address-keyed record storage.
#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    records: HashMap<Address, Vec<u8>>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw encoded bytes at an address, if occupied.
    pub fn get_raw(&self, address: &Address) -> Option<&[u8]> {
        self.records.get(address).map(Vec::as_slice)
    }

    /// Decode the record at an address.
    ///
    /// `Ok(None)` for a vacant address; `Err` only for corrupt bytes,
    /// which cannot happen through this type's own API.
    pub fn get(&self, address: &Address) -> Result<Option<Record>, RegistryError> {
        match self.records.get(address) {
            Some(bytes) => Record::decode(bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Whether the address holds a record.
    pub fn contains(&self, address: &Address) -> bool {
        self.records.contains_key(address)
    }

    /// Create a record at a vacant address.
    ///
    /// This is the primitive behind every uniqueness invariant in the
    /// registry: identity-per-owner and nonce-per-authority both reduce to
    /// "the derived address was already occupied".
    pub fn insert_new(&mut self, address: Address, record: &Record) -> Result<(), RegistryError> {
        if self.records.contains_key(&address) {
            return Err(RegistryError::AlreadyExists(address));
        }
        let bytes = record.encode()?;
        self.records.insert(address, bytes);
        Ok(())
    }

    /// Replace the record at an occupied address.
    ///
    /// Callers validate first; this only refuses to materialize records at
    /// addresses that were never created.
    pub fn put(&mut self, address: Address, record: &Record) -> Result<(), RegistryError> {
        if !self.records.contains_key(&address) {
            return Err(RegistryError::NotFound(address));
        }
        let bytes = record.encode()?;
        self.records.insert(address, bytes);
        Ok(())
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over (address, encoded bytes) pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Vec<u8>)> {
        self.records.iter()
    }

    /// Read the primary authorization key at the reserved offset of an
    /// encoded record, without decoding the body.
    ///
    /// This is the hook for external filter queries by owner/authority.
    pub fn primary_key_bytes(encoded: &[u8]) -> Option<&[u8]> {
        encoded.get(PRIMARY_KEY_RANGE)
    }

    /// Compute the deterministic state root over all records.
    ///
    /// An empty store returns the all-zero sentinel.
    pub fn root_hash(&self) -> [u8; 32] {
        if self.records.is_empty() {
            return [0u8; 32];
        }

        let sorted: BTreeMap<&Address, &Vec<u8>> = self.records.iter().collect();
        let leaves: Vec<[u8; 32]> = sorted
            .iter()
            .map(|(addr, bytes)| blake3_hash_multi(&[addr.as_bytes().as_slice(), bytes]))
            .collect();

        merkle_root(&leaves)
    }
}
