//! Transaction signing capability
//!
//! Orchestration code hands a [`TransactionSigner`] to collaborators instead
//! of raw key material. The address a transaction is paid from and the
//! capability that signs it are kept as separate values.

use std::fmt::{self, Debug};

use async_trait::async_trait;
use ed25519_dalek::SigningKey;

use crate::address::Address;
use crate::error::Error;
use crate::transaction::VersionedTransaction;

/// Signs transactions on behalf of one address
#[async_trait]
pub trait TransactionSigner: Debug + Send + Sync {
    /// Address whose signature this signer produces
    fn address(&self) -> Address;

    /// Sign `transaction`, returning it with the signer's slot filled
    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction, Error>;
}

/// In-memory ed25519 keypair
///
/// The secret half is zeroized on drop.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Create from an existing signing key
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Create from 32 secret bytes
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    /// Address of this keypair
    pub fn address(&self) -> Address {
        Address::from(self.signing_key.verifying_key())
    }

    /// Sign a transaction synchronously
    pub fn sign(&self, transaction: &mut VersionedTransaction) -> Result<(), Error> {
        transaction.sign(&self.signing_key)
    }
}

impl Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl TransactionSigner for Keypair {
    fn address(&self) -> Address {
        Keypair::address(self)
    }

    async fn sign_transaction(
        &self,
        mut transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction, Error> {
        self.sign(&mut transaction)?;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_debug_redacts_secret() {
        let keypair = Keypair::from_secret_bytes(&[11u8; 32]);
        let debug = format!("{keypair:?}");

        assert!(debug.contains("<redacted>"));
        assert!(debug.contains(&keypair.address().to_string()));
        assert!(!debug.contains("signing_key"));
    }
}
