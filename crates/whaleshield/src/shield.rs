//! Shield service
//!
//! Moves value between the user's public wallet and the shielded pool
//! outside of a trade.

use std::sync::Arc;

use tracing::instrument;
use whaleshield_common::{
    Address, Amount, AssetId, DepositRequest, ShieldedPool, TransactionRef, TransactionSigner,
    WithdrawRequest,
};

use crate::Error;

/// Deposits into and withdrawals from the shielded pool
#[derive(Debug, Clone)]
pub struct ShieldService {
    pool: Arc<dyn ShieldedPool>,
}

impl ShieldService {
    /// Create new [`ShieldService`]
    pub fn new(pool: Arc<dyn ShieldedPool>) -> Self {
        Self { pool }
    }

    /// Deposit `amount` of the native asset from the public wallet behind `signer`
    ///
    /// The public wallet pays for and signs the deposit.
    #[instrument(skip(self, signer), fields(wallet = %signer.address()))]
    pub async fn shield(
        &self,
        amount: Amount,
        signer: &dyn TransactionSigner,
    ) -> Result<TransactionRef, Error> {
        if amount.is_zero() {
            return Err(Error::InvalidAmount);
        }

        let deposit_ref = self
            .pool
            .deposit(DepositRequest {
                asset: &AssetId::native(),
                amount,
                signer_address: signer.address(),
                transaction_signer: signer,
            })
            .await
            .map_err(|err| Error::DepositFailed(err.to_string()))?;

        tracing::info!("Shielded {}: {}", amount, deposit_ref);

        Ok(deposit_ref)
    }

    /// Withdraw `amount` from the pool to `recipient`
    #[instrument(skip(self))]
    pub async fn unshield(
        &self,
        amount: Amount,
        recipient: Address,
    ) -> Result<TransactionRef, Error> {
        if amount.is_zero() {
            return Err(Error::InvalidAmount);
        }

        let withdraw_ref = self
            .pool
            .withdraw(WithdrawRequest { amount, recipient })
            .await
            .map_err(|err| Error::WithdrawFailed(err.to_string()))?;

        tracing::info!("Unshielded {} to {}: {}", amount, recipient, withdraw_ref);

        Ok(withdraw_ref)
    }

    /// Current shielded balance
    pub async fn private_balance(&self) -> Result<Amount, Error> {
        Ok(self.pool.private_balance().await?)
    }
}

#[cfg(test)]
mod tests {
    use whaleshield_common::Error as CommonError;

    use super::*;
    use crate::identity::EphemeralIdentity;
    use crate::test_utils::MockPool;

    #[tokio::test]
    async fn test_zero_amounts_rejected_before_pool() {
        let pool = Arc::new(MockPool::new());
        let service = ShieldService::new(pool.clone());
        let wallet = EphemeralIdentity::generate().unwrap();

        assert!(matches!(
            service.shield(Amount::ZERO, &wallet).await,
            Err(Error::InvalidAmount)
        ));
        assert!(matches!(
            service.unshield(Amount::ZERO, wallet.address()).await,
            Err(Error::InvalidAmount)
        ));
        assert_eq!(pool.withdraw_calls(), 0);
        assert!(pool.deposits().is_empty());
    }

    #[tokio::test]
    async fn test_shield_signed_by_public_wallet() {
        let pool = Arc::new(MockPool::new());
        let service = ShieldService::new(pool.clone());
        let wallet = EphemeralIdentity::generate().unwrap();

        service.shield(Amount::from(42), &wallet).await.unwrap();

        assert_eq!(pool.deposits(), vec![(Amount::from(42), wallet.address())]);
    }

    #[tokio::test]
    async fn test_pool_errors_mapped() {
        let pool = Arc::new(MockPool::new());
        pool.set_withdraw_response(Err(CommonError::InsufficientFunds));
        pool.set_balance_response(Ok(Amount::from(9)));
        let service = ShieldService::new(pool.clone());

        let err = service
            .unshield(Amount::from(10), Address::new([1u8; 32]))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Withdraw from privacy pool failed: Insufficient Funds"
        );
        assert_eq!(service.private_balance().await.unwrap(), Amount::from(9));
    }
}
