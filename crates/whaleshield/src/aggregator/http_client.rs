//! HTTP aggregator client

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;
use whaleshield_common::{Address, Amount, AssetId};

use super::{AggregatorConfig, SwapAggregator, SwapQuote};
use crate::Error;

#[derive(Debug, Clone)]
struct HttpClientCore {
    inner: Client,
}

impl HttpClientCore {
    fn new() -> Self {
        Self {
            inner: Client::new(),
        }
    }

    fn with_client(inner: Client) -> Self {
        Self { inner }
    }

    /// Read the body of `response`, failing with its status and body when not successful
    async fn read_response<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, Error> {
        let status = response.status();

        let body = response.text().await.map_err(|e| {
            Error::HttpError(
                e.status().map(|status_code| status_code.as_u16()),
                e.to_string(),
            )
        })?;

        if !status.is_success() {
            tracing::warn!("Aggregator responded with {}: {}", status, body);
            return Err(Error::HttpError(Some(status.as_u16()), body));
        }

        serde_json::from_str::<R>(&body).map_err(|err| {
            tracing::warn!("Http Response error: {}", err);
            err.into()
        })
    }

    async fn http_get<R: DeserializeOwned>(&self, url: Url) -> Result<R, Error> {
        let response = self.inner.get(url).send().await.map_err(|e| {
            Error::HttpError(
                e.status().map(|status_code| status_code.as_u16()),
                e.to_string(),
            )
        })?;

        Self::read_response(response).await
    }

    async fn http_post<P: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        url: Url,
        payload: &P,
    ) -> Result<R, Error> {
        let response = self
            .inner
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                Error::HttpError(
                    e.status().map(|status_code| status_code.as_u16()),
                    e.to_string(),
                )
            })?;

        Self::read_response(response).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequest<'a> {
    quote_response: &'a SwapQuote,
    user_public_key: String,
    wrap_and_unwrap_sol: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    swap_transaction: String,
}

/// Extract the service's diagnostic from an error
fn diagnostic(err: Error) -> String {
    match err {
        Error::HttpError(_, body) => body,
        err => err.to_string(),
    }
}

/// Aggregator client speaking the quote/swap HTTP API
#[derive(Debug, Clone)]
pub struct HttpAggregatorClient {
    core: HttpClientCore,
    base_url: Url,
    wrap_and_unwrap_sol: bool,
}

impl HttpAggregatorClient {
    /// Create new [`HttpAggregatorClient`]
    pub fn new(config: AggregatorConfig) -> Result<Self, Error> {
        Ok(Self {
            core: HttpClientCore::new(),
            base_url: Url::parse(&config.url)?,
            wrap_and_unwrap_sol: config.wrap_and_unwrap_sol,
        })
    }

    /// Create new [`HttpAggregatorClient`] on top of an existing reqwest client
    pub fn with_client(config: AggregatorConfig, client: Client) -> Result<Self, Error> {
        Ok(Self {
            core: HttpClientCore::with_client(client),
            base_url: Url::parse(&config.url)?,
            wrap_and_unwrap_sol: config.wrap_and_unwrap_sol,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::UrlPathSegments)?
            .pop_if_empty()
            .push(path);
        Ok(url)
    }
}

#[async_trait]
impl SwapAggregator for HttpAggregatorClient {
    #[instrument(skip(self))]
    async fn get_quote(
        &self,
        input: &AssetId,
        output: &AssetId,
        amount: Amount,
        slippage_bps: u16,
    ) -> Result<SwapQuote, Error> {
        let mut url = self.endpoint("quote")?;
        url.query_pairs_mut()
            .append_pair("inputMint", input.as_str())
            .append_pair("outputMint", output.as_str())
            .append_pair("amount", &amount.to_string())
            .append_pair("slippageBps", &slippage_bps.to_string());

        let quote: SwapQuote = self
            .core
            .http_get(url)
            .await
            .map_err(|err| Error::QuoteUnavailable(diagnostic(err)))?;

        tracing::debug!(
            "Quoted {} {} for {} {}",
            quote.in_amount,
            quote.input_mint,
            quote.out_amount,
            quote.output_mint
        );

        Ok(quote)
    }

    #[instrument(skip(self, quote))]
    async fn get_swap_transaction(
        &self,
        quote: &SwapQuote,
        payer: &Address,
    ) -> Result<Vec<u8>, Error> {
        let url = self.endpoint("swap")?;
        let request = SwapRequest {
            quote_response: quote,
            user_public_key: payer.to_string(),
            wrap_and_unwrap_sol: self.wrap_and_unwrap_sol,
        };

        let response: SwapResponse = self
            .core
            .http_post(url, &request)
            .await
            .map_err(|err| Error::SwapBuildFailed(diagnostic(err)))?;

        BASE64
            .decode(response.swap_transaction.trim())
            .map_err(|e| Error::SwapBuildFailed(format!("invalid swap transaction encoding: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = HttpAggregatorClient::new(AggregatorConfig::default()).unwrap();

        assert_eq!(
            client.endpoint("quote").unwrap().as_str(),
            "https://quote-api.jup.ag/v6/quote"
        );

        let client = HttpAggregatorClient::new(AggregatorConfig {
            url: "http://localhost:8080/".to_string(),
            wrap_and_unwrap_sol: false,
        })
        .unwrap();
        assert_eq!(
            client.endpoint("swap").unwrap().as_str(),
            "http://localhost:8080/swap"
        );
    }
}
