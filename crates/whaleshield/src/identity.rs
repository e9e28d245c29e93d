//! Ephemeral identity
//!
//! A keypair generated fresh for a single trade. It is never written to any
//! store and must not be reused across trades: reuse would link the trades
//! that share it.

use std::fmt;

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use whaleshield_common::{Address, Keypair, TransactionSigner, VersionedTransaction};
use zeroize::Zeroizing;

use crate::Error;

/// Single-use identity owning the key that signs one trade's transactions
pub struct EphemeralIdentity {
    keypair: Keypair,
}

impl EphemeralIdentity {
    /// Generate a new identity from the operating system's randomness source
    pub fn generate() -> Result<Self, Error> {
        let mut secret = Zeroizing::new([0u8; 32]);
        OsRng
            .try_fill_bytes(&mut secret[..])
            .map_err(|e| Error::Identity(e.to_string()))?;

        let identity = Self {
            keypair: Keypair::from_signing_key(SigningKey::from_bytes(&secret)),
        };

        tracing::debug!("Generated ephemeral identity {}", identity.address());

        Ok(identity)
    }

    /// Public address
    pub fn address(&self) -> Address {
        self.keypair.address()
    }
}

impl fmt::Debug for EphemeralIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralIdentity")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TransactionSigner for EphemeralIdentity {
    fn address(&self) -> Address {
        EphemeralIdentity::address(self)
    }

    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction, whaleshield_common::Error> {
        self.keypair.sign_transaction(transaction).await
    }
}
