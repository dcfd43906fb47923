//! The recovery protocol: guardian enrollment and ownership recovery.
//!
//! Recovery is the one path that mutates an identity's `owner` field, and
//! it works without any trusted third party: the current owner enrolls
//! guardian keys while in control, and any enrolled guardian can later
//! take ownership by signing a recover transition.
//!
//! A successful recovery clears the entire guardian set. Leaving it in
//! place would let any guardian enrolled under the *old* owner — the
//! acting one included — re-trigger recovery against the new owner, which
//! turns a safety mechanism into a standing hostile takeover. The new
//! owner starts with no standing guardians and enrolls their own.

use crate::address::Address;
use crate::crypto::PublicKey;
use crate::error::RegistryError;
use crate::record::{Identity, Record};
use crate::registry::Registry;

impl Registry {
    /// Enroll `guardian` on `payer`'s identity.
    pub fn add_recovery_account(
        &mut self,
        payer: &PublicKey,
        guardian: PublicKey,
    ) -> Result<Address, RegistryError> {
        let (address, mut identity) = self.owned_identity(payer)?;
        identity.add_recovery_account(guardian)?;
        self.store_mut().put(address, &Record::Identity(identity))?;

        tracing::info!(owner = %payer, guardian = %guardian, "recovery account enrolled");
        Ok(address)
    }

    /// Unenroll `guardian` from `payer`'s identity.
    ///
    /// Removing a guardian that is not enrolled fails with
    /// [`RegistryError::GuardianNotFound`].
    pub fn remove_recovery_account(
        &mut self,
        payer: &PublicKey,
        guardian: &PublicKey,
    ) -> Result<Address, RegistryError> {
        let (address, mut identity) = self.owned_identity(payer)?;
        identity.remove_recovery_account(guardian)?;
        self.store_mut().put(address, &Record::Identity(identity))?;

        tracing::info!(owner = %payer, guardian = %guardian, "recovery account removed");
        Ok(address)
    }

    /// Take ownership of the identity at `identity_address` as `signer`.
    ///
    /// The signer must be enrolled in the identity's *current* guardian
    /// list — entries valid under a previous owner were cleared when that
    /// owner's tenure ended. On success the signer is the owner and the
    /// guardian set is empty.
    pub fn recover(
        &mut self,
        signer: &PublicKey,
        identity_address: &Address,
    ) -> Result<Address, RegistryError> {
        let mut identity = self
            .identity_at(identity_address)?
            .ok_or(RegistryError::NotFound(*identity_address))?;

        let previous_owner = identity.owner;
        identity.recover(signer, self.now())?;
        self.store_mut()
            .put(*identity_address, &Record::Identity(identity))?;

        tracing::warn!(
            address = %identity_address,
            previous_owner = %previous_owner,
            new_owner = %signer,
            "identity ownership recovered"
        );
        Ok(*identity_address)
    }

    /// Load `payer`'s identity and check the ownership rule shared by all
    /// guardian-list mutations.
    fn owned_identity(
        &self,
        payer: &PublicKey,
    ) -> Result<(Address, Identity), RegistryError> {
        let address = Address::identity(payer)?;
        let identity = self
            .identity_at(&address)?
            .ok_or(RegistryError::NotFound(address))?;

        if identity.owner != *payer {
            return Err(RegistryError::Unauthorized {
                reason: "only the current owner may manage recovery accounts",
            });
        }
        Ok((address, identity))
    }
}
