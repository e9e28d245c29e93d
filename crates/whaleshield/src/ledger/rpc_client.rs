//! JSON-RPC ledger client

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;
use url::Url;
use whaleshield_common::{
    Address, Amount, Error, LedgerConnector, TransactionRef, VersionedTransaction,
};

use super::{Commitment, RpcConfig};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    err: Option<Value>,
    confirmation_status: Option<Commitment>,
}

/// Ledger connector speaking the node JSON-RPC API
#[derive(Debug)]
pub struct RpcClient {
    inner: Client,
    url: Url,
    commitment: Commitment,
    confirm_poll_interval: Duration,
    confirm_max_attempts: u32,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create new [`RpcClient`]
    pub fn new(config: RpcConfig) -> Result<Self, crate::Error> {
        Self::with_client(config, Client::new())
    }

    /// Create new [`RpcClient`] on top of an existing reqwest client
    pub fn with_client(config: RpcConfig, client: Client) -> Result<Self, crate::Error> {
        Ok(Self {
            inner: client,
            url: Url::parse(&config.url)?,
            commitment: config.commitment,
            confirm_poll_interval: config.confirm_poll_interval(),
            confirm_max_attempts: config.confirm_max_attempts,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, Error> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .inner
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Ledger(format!("{method}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Ledger(format!("{method}: {e}")))?;

        if !status.is_success() {
            tracing::warn!("RPC {} responded with {}: {}", method, status, body);
            return Err(Error::Ledger(format!("{method}: {status}: {body}")));
        }

        let response: RpcResponse<R> = serde_json::from_str(&body)?;

        match (response.result, response.error) {
            (_, Some(err)) => Err(Error::Ledger(format!(
                "{method}: {} ({})",
                err.message, err.code
            ))),
            (Some(result), None) => Ok(result),
            (None, None) => Err(Error::Ledger(format!("{method}: empty response"))),
        }
    }
}

#[async_trait]
impl LedgerConnector for RpcClient {
    #[instrument(skip(self))]
    async fn get_balance(&self, address: &Address) -> Result<Amount, Error> {
        let balance: WithContext<u64> = self
            .call(
                "getBalance",
                json!([address.to_string(), { "commitment": self.commitment.as_str() }]),
            )
            .await?;

        Ok(Amount::from(balance.value))
    }

    #[instrument(skip_all)]
    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<TransactionRef, Error> {
        let signature: String = self
            .call(
                "sendTransaction",
                json!([
                    transaction.to_base64(),
                    {
                        "encoding": "base64",
                        "preflightCommitment": self.commitment.as_str(),
                    }
                ]),
            )
            .await?;

        tracing::debug!("Broadcast transaction {}", signature);

        Ok(TransactionRef::new(signature))
    }

    #[instrument(skip(self))]
    async fn confirm_transaction(&self, signature: &TransactionRef) -> Result<(), Error> {
        for attempt in 1..=self.confirm_max_attempts {
            let statuses: WithContext<Vec<Option<SignatureStatus>>> = self
                .call(
                    "getSignatureStatuses",
                    json!([[signature.as_str()], { "searchTransactionHistory": true }]),
                )
                .await?;

            if let Some(Some(status)) = statuses.value.into_iter().next() {
                if let Some(err) = status.err {
                    return Err(Error::TransactionFailed(
                        signature.to_string(),
                        err.to_string(),
                    ));
                }

                if status
                    .confirmation_status
                    .is_some_and(|reached| reached >= self.commitment)
                {
                    tracing::debug!("{} confirmed after {} polls", signature, attempt);
                    return Ok(());
                }
            }

            tokio::time::sleep(self.confirm_poll_interval).await;
        }

        tracing::warn!(
            "{} not confirmed after {} polls",
            signature,
            self.confirm_max_attempts
        );

        Err(Error::Timeout)
    }
}
