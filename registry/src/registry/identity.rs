//! Identity registry operations: self-registration and metadata updates.

use crate::address::Address;
use crate::crypto::PublicKey;
use crate::error::RegistryError;
use crate::record::{Identity, Record};
use crate::registry::Registry;

impl Registry {
    /// Self-register an identity for `payer`.
    ///
    /// The target address is derived from the payer key, so at most one
    /// identity can ever exist per owner: a second creation lands on the
    /// same address and fails with [`RegistryError::AlreadyExists`].
    ///
    /// Requires an initialized network — identity creation rides through
    /// the network record to bump its identity counter.
    pub fn create_identity(
        &mut self,
        payer: &PublicKey,
        metadata_uri: String,
        metadata_merkle_root: Vec<u8>,
    ) -> Result<Address, RegistryError> {
        let network_address = Address::network()?;
        let mut network = self
            .network()?
            .ok_or(RegistryError::NotFound(network_address))?;

        let address = Address::identity(payer)?;
        let identity = Identity::create(*payer, metadata_uri, metadata_merkle_root, self.now())?;

        // The identity insert is the only fallible write; the counter bump
        // follows it so a lost creation race leaves the network untouched.
        self.store_mut()
            .insert_new(address, &Record::Identity(identity))?;
        network.total_identities += 1;
        self.store_mut()
            .put(network_address, &Record::Network(network))?;

        tracing::info!(owner = %payer, %address, "identity created");
        Ok(address)
    }

    /// Replace the metadata of `payer`'s identity.
    ///
    /// Both metadata fields are replaced atomically; owner and guardians
    /// are untouched. Only the current owner may update — which, because
    /// the address is derived from the owner key, also means a payer whose
    /// identity was recovered away from them is refused here.
    pub fn update_identity(
        &mut self,
        payer: &PublicKey,
        metadata_uri: String,
        metadata_merkle_root: Vec<u8>,
    ) -> Result<Address, RegistryError> {
        let address = Address::identity(payer)?;
        let mut identity = self
            .identity_at(&address)?
            .ok_or(RegistryError::NotFound(address))?;

        if identity.owner != *payer {
            return Err(RegistryError::Unauthorized {
                reason: "only the current owner may update an identity",
            });
        }

        identity.update(metadata_uri, metadata_merkle_root, self.now())?;
        self.store_mut().put(address, &Record::Identity(identity))?;

        tracing::debug!(owner = %payer, %address, "identity metadata updated");
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::record::MAX_URI_LENGTH;

    fn registry_with_network() -> Registry {
        let mut registry = Registry::new();
        let admin = Keypair::from_seed(&[99u8; 32]).public_key();
        registry.initialize_network(&admin).unwrap();
        registry
    }

    #[test]
    fn create_identity_writes_owner_and_bumps_counter() {
        let mut registry = registry_with_network();
        let owner = Keypair::from_seed(&[1u8; 32]).public_key();

        let address = registry
            .create_identity(&owner, "https://example.com".into(), vec![0xAB; 16])
            .unwrap();
        assert_eq!(address, Address::identity(&owner).unwrap());

        let identity = registry.identity(&owner).unwrap().unwrap();
        assert_eq!(identity.owner, owner);
        assert_eq!(identity.metadata_uri, "https://example.com");
        assert!(identity.recovery_accounts.is_empty());

        assert_eq!(registry.network().unwrap().unwrap().total_identities, 1);
    }

    #[test]
    fn at_most_one_identity_per_owner() {
        let mut registry = registry_with_network();
        let owner = Keypair::from_seed(&[1u8; 32]).public_key();

        registry
            .create_identity(&owner, "https://a".into(), vec![1; 16])
            .unwrap();
        let err = registry
            .create_identity(&owner, "https://b".into(), vec![2; 16])
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyExists(_)));

        // The original record and the counter are unchanged.
        let identity = registry.identity(&owner).unwrap().unwrap();
        assert_eq!(identity.metadata_uri, "https://a");
        assert_eq!(registry.network().unwrap().unwrap().total_identities, 1);
    }

    #[test]
    fn create_identity_requires_network() {
        let mut registry = Registry::new();
        let owner = Keypair::from_seed(&[1u8; 32]).public_key();
        assert!(matches!(
            registry.create_identity(&owner, "u".into(), vec![]),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn update_replaces_metadata_in_place() {
        let mut registry = registry_with_network();
        let owner = Keypair::from_seed(&[1u8; 32]).public_key();
        registry
            .create_identity(&owner, "https://a".into(), vec![1; 16])
            .unwrap();

        registry
            .update_identity(&owner, "https://b".into(), vec![2; 16])
            .unwrap();

        let identity = registry.identity(&owner).unwrap().unwrap();
        assert_eq!(identity.metadata_uri, "https://b");
        assert_eq!(identity.metadata_merkle_root, vec![2; 16]);
        assert_eq!(identity.owner, owner);
    }

    #[test]
    fn old_owner_cannot_update_after_recovery() {
        // After recovery the record still lives at the old owner's derived
        // address, so their update resolves to an existing record — the
        // ownership check is what refuses them.
        let mut registry = registry_with_network();
        let owner = Keypair::from_seed(&[1u8; 32]).public_key();
        let guardian = Keypair::from_seed(&[2u8; 32]).public_key();
        registry
            .create_identity(&owner, "https://a".into(), vec![1; 16])
            .unwrap();
        registry.add_recovery_account(&owner, guardian).unwrap();

        let address = Address::identity(&owner).unwrap();
        registry.recover(&guardian, &address).unwrap();
        let raw_before = registry.store().get_raw(&address).unwrap().to_vec();

        assert!(matches!(
            registry.update_identity(&owner, "https://b".into(), vec![2; 16]),
            Err(RegistryError::Unauthorized { .. })
        ));
        assert_eq!(registry.store().get_raw(&address).unwrap(), raw_before);
    }

    #[test]
    fn update_of_missing_identity_is_not_found() {
        let mut registry = registry_with_network();
        let owner = Keypair::from_seed(&[1u8; 32]).public_key();
        assert!(matches!(
            registry.update_identity(&owner, "u".into(), vec![]),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn oversized_uri_rejected_store_unchanged() {
        let mut registry = registry_with_network();
        let owner = Keypair::from_seed(&[1u8; 32]).public_key();
        let root_before = registry.root_hash();

        let uri = "x".repeat(MAX_URI_LENGTH + 1);
        assert!(matches!(
            registry.create_identity(&owner, uri, vec![]),
            Err(RegistryError::MalformedInput { .. })
        ));
        assert_eq!(registry.root_hash(), root_before);
    }
}
