#![cfg(test)]
#![allow(missing_docs)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Map;
use whaleshield_common::transaction::LegacyMessage;
use whaleshield_common::{
    Address, Amount, AssetId, DepositRequest, Error as CommonError, LedgerConnector,
    ShieldedPool, TransactionRef, TransactionSigner, VersionedTransaction, WithdrawRequest,
};

use crate::aggregator::{SwapAggregator, SwapQuote};
use crate::Error;

/// Program id used by mock swap transactions
pub const TEST_PROGRAM: Address = Address::new([9u8; 32]);

/// Create a test quote
pub fn test_quote(in_amount: u64, out_amount: u64) -> SwapQuote {
    SwapQuote {
        input_mint: AssetId::native(),
        output_mint: AssetId::usdc(),
        in_amount: Amount::from(in_amount),
        out_amount: Amount::from(out_amount),
        other_amount_threshold: Amount::from(out_amount),
        swap_mode: "ExactIn".to_string(),
        slippage_bps: 50,
        price_impact_pct: None,
        route_plan: Vec::new(),
        context_slot: None,
        time_taken: None,
        extra: Map::new(),
    }
}

#[derive(Debug, Default)]
pub struct MockPool {
    pub withdraw_response: Mutex<Option<Result<TransactionRef, CommonError>>>,
    pub deposit_response: Mutex<Option<Result<TransactionRef, CommonError>>>,
    pub balance_response: Mutex<Option<Result<Amount, CommonError>>>,
    withdraws: Mutex<Vec<WithdrawRequest>>,
    deposits: Mutex<Vec<(Amount, Address)>>,
    withdraw_calls: AtomicUsize,
}

impl MockPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_withdraw_response(&self, response: Result<TransactionRef, CommonError>) {
        *self.withdraw_response.lock().unwrap() = Some(response);
    }

    pub fn set_deposit_response(&self, response: Result<TransactionRef, CommonError>) {
        *self.deposit_response.lock().unwrap() = Some(response);
    }

    pub fn set_balance_response(&self, response: Result<Amount, CommonError>) {
        *self.balance_response.lock().unwrap() = Some(response);
    }

    pub fn withdraw_calls(&self) -> usize {
        self.withdraw_calls.load(Ordering::SeqCst)
    }

    pub fn withdraws(&self) -> Vec<WithdrawRequest> {
        self.withdraws.lock().unwrap().clone()
    }

    /// Successful deposits as (amount, signer)
    pub fn deposits(&self) -> Vec<(Amount, Address)> {
        self.deposits.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShieldedPool for MockPool {
    async fn withdraw(&self, request: WithdrawRequest) -> Result<TransactionRef, CommonError> {
        self.withdraw_calls.fetch_add(1, Ordering::SeqCst);
        self.withdraws.lock().unwrap().push(request);

        self.withdraw_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(TransactionRef::new("mock-withdraw")))
    }

    async fn deposit(&self, request: DepositRequest<'_>) -> Result<TransactionRef, CommonError> {
        assert_eq!(request.transaction_signer.address(), request.signer_address);

        let response = self
            .deposit_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(TransactionRef::new("mock-deposit")));

        if response.is_ok() {
            self.deposits
                .lock()
                .unwrap()
                .push((request.amount, request.signer_address));
        }

        response
    }

    async fn private_balance(&self) -> Result<Amount, CommonError> {
        self.balance_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Ok(Amount::ZERO))
    }
}

#[derive(Debug, Default)]
pub struct MockLedger {
    /// Balances returned in order before falling back to `default_balance`
    balances: Mutex<VecDeque<Result<Amount, CommonError>>>,
    default_balance: Mutex<Amount>,
    pub send_response: Mutex<Option<Result<TransactionRef, CommonError>>>,
    pub confirm_response: Mutex<Option<Result<(), CommonError>>>,
    sent: Mutex<Vec<VersionedTransaction>>,
    balance_calls: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_balances(&self, balances: Vec<Result<Amount, CommonError>>) {
        self.balances.lock().unwrap().extend(balances);
    }

    pub fn set_default_balance(&self, balance: Amount) {
        *self.default_balance.lock().unwrap() = balance;
    }

    pub fn set_send_response(&self, response: Result<TransactionRef, CommonError>) {
        *self.send_response.lock().unwrap() = Some(response);
    }

    pub fn set_confirm_response(&self, response: Result<(), CommonError>) {
        *self.confirm_response.lock().unwrap() = Some(response);
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn sent_transactions(&self) -> Vec<VersionedTransaction> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerConnector for MockLedger {
    async fn get_balance(&self, _address: &Address) -> Result<Amount, CommonError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);

        match self.balances.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(*self.default_balance.lock().unwrap()),
        }
    }

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<TransactionRef, CommonError> {
        self.sent.lock().unwrap().push(transaction.clone());

        match self.send_response.lock().unwrap().take() {
            Some(response) => response,
            None => transaction
                .id()
                .ok_or(CommonError::Ledger("unsigned transaction".to_string())),
        }
    }

    async fn confirm_transaction(&self, _signature: &TransactionRef) -> Result<(), CommonError> {
        self.confirm_response.lock().unwrap().take().unwrap_or(Ok(()))
    }
}

#[derive(Debug, Default)]
pub struct MockAggregator {
    pub quote_response: Mutex<Option<Result<SwapQuote, Error>>>,
    pub swap_response: Mutex<Option<Result<Vec<u8>, Error>>>,
    quote_calls: AtomicUsize,
}

impl MockAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_quote_response(&self, response: Result<SwapQuote, Error>) {
        *self.quote_response.lock().unwrap() = Some(response);
    }

    pub fn set_swap_response(&self, response: Result<Vec<u8>, Error>) {
        *self.swap_response.lock().unwrap() = Some(response);
    }

    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SwapAggregator for MockAggregator {
    async fn get_quote(
        &self,
        input: &AssetId,
        output: &AssetId,
        amount: Amount,
        _slippage_bps: u16,
    ) -> Result<SwapQuote, Error> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);

        match self.quote_response.lock().unwrap().take() {
            Some(response) => response,
            None => {
                let mut quote = test_quote(amount.to_u64(), amount.to_u64());
                quote.input_mint = input.clone();
                quote.output_mint = output.clone();
                Ok(quote)
            }
        }
    }

    async fn get_swap_transaction(
        &self,
        quote: &SwapQuote,
        payer: &Address,
    ) -> Result<Vec<u8>, Error> {
        if let Some(response) = self.swap_response.lock().unwrap().take() {
            return response;
        }

        let transaction = LegacyMessage::new_with_payer(
            *payer,
            TEST_PROGRAM,
            quote.in_amount.to_u64().to_le_bytes().to_vec(),
            [1u8; 32],
        )
        .into_transaction()?;

        Ok(transaction.to_bytes())
    }
}
