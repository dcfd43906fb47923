//! Network configuration operations.
//!
//! The network record is a global mutable singleton at a well-known derived
//! address. There is no in-memory mirror of it anywhere: the persisted
//! record is the single source of truth, read fresh on every validation
//! that needs it.

use crate::address::Address;
use crate::crypto::PublicKey;
use crate::error::RegistryError;
use crate::record::{NetworkConfig, Record};
use crate::registry::Registry;

impl Registry {
    /// Create the network configuration singleton.
    ///
    /// First writer wins and becomes admin — there is nothing to be
    /// authorized *against* before the network exists. Every later attempt
    /// fails with [`RegistryError::AlreadyInitialized`].
    pub fn initialize_network(&mut self, payer: &PublicKey) -> Result<Address, RegistryError> {
        let address = Address::network()?;
        if self.store().contains(&address) {
            return Err(RegistryError::AlreadyInitialized);
        }

        let config = NetworkConfig {
            admin: *payer,
            total_identities: 0,
            created_at: self.now(),
        };
        self.store_mut().insert_new(address, &Record::Network(config))?;

        tracing::info!(admin = %payer, %address, "network initialized");
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    #[test]
    fn first_writer_becomes_admin() {
        let mut registry = Registry::new();
        let admin = Keypair::from_seed(&[1u8; 32]).public_key();

        let address = registry.initialize_network(&admin).unwrap();
        assert_eq!(address, Address::network().unwrap());

        let config = registry.network().unwrap().unwrap();
        assert_eq!(config.admin, admin);
        assert_eq!(config.total_identities, 0);
    }

    #[test]
    fn second_initialization_rejected_admin_preserved() {
        let mut registry = Registry::new();
        let first = Keypair::from_seed(&[1u8; 32]).public_key();
        let second = Keypair::from_seed(&[2u8; 32]).public_key();

        registry.initialize_network(&first).unwrap();
        assert!(matches!(
            registry.initialize_network(&second),
            Err(RegistryError::AlreadyInitialized)
        ));

        // The admin anchor must survive the failed race.
        assert_eq!(registry.network().unwrap().unwrap().admin, first);
    }

    #[test]
    fn uninitialized_network_reads_as_none() {
        let registry = Registry::new();
        assert_eq!(registry.network().unwrap(), None);
    }
}
