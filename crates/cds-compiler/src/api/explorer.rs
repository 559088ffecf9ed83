//! Block-explorer client for verified contract ABIs.

use crate::abi::{parse_abi_str, AbiEntry};
use crate::api::{read_response_bounded, truncate_error_body};
use crate::config::{ChainExplorer, ExplorerApi, ExplorerConfig};
use crate::error::{CdsError, CdsResult};
use crate::retry::RetryExecutor;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Etherscan's answer when the free-tier call budget is exhausted.
const ETHERSCAN_RATE_LIMIT_MARKER: &str = "rate limit";

/// Normalizes a contract address to lowercase `0x`-prefixed hex.
///
/// # Errors
///
/// Returns [`CdsError::InvalidAddress`] unless `address` is 20 hex-encoded
/// bytes, with or without a `0x` prefix.
pub fn normalize_address(address: &str) -> CdsResult<String> {
    let trimmed = address.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes =
        hex::decode(digits).map_err(|e| CdsError::InvalidAddress(format!("{address}: {e}")))?;
    if bytes.len() != 20 {
        return Err(CdsError::InvalidAddress(format!(
            "{address}: expected 20 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(format!("0x{}", hex::encode(bytes)))
}

/// `{ status, message, result }` envelope of Etherscan-style APIs.
#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

/// `{ abi }` answer of the contract verifier.
#[derive(Debug, Deserialize)]
struct VerifierResponse {
    #[serde(default)]
    abi: Option<Value>,
}

/// Fetches verified contract ABIs from block explorers.
///
/// Transient failures are retried according to the
/// [`ExplorerConfig::retry_config`].
///
/// # Example
///
/// ```rust,no_run
/// use cds_compiler::api::AbiExplorerClient;
/// use cds_compiler::config::ExplorerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = AbiExplorerClient::new(ExplorerConfig::from_env())?;
///     let abi = client
///         .fetch_abi("eip155:1", "0xdAC17F958D2ee523a2206206994597C13D831ec7")
///         .await?;
///     println!("{abi}");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AbiExplorerClient {
    config: ExplorerConfig,
    client: Client,
    retry: RetryExecutor,
}

impl AbiExplorerClient {
    /// Creates a new explorer client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: ExplorerConfig) -> CdsResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(CdsError::Http)?;
        let retry = RetryExecutor::new(config.retry_config().clone());
        Ok(Self {
            config,
            client,
            retry,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Fetches the ABI of `address` on `chain` as a JSON string.
    ///
    /// # Errors
    ///
    /// - [`CdsError::MissingParameter`] if `chain` or `address` is empty
    /// - [`CdsError::UnsupportedChain`] if `chain` has no explorer
    /// - [`CdsError::Config`] if the explorer needs a token and none is set
    /// - [`CdsError::InvalidAddress`] if `address` is malformed
    /// - [`CdsError::Api`], [`CdsError::RateLimited`] or [`CdsError::Http`]
    ///   if the explorer request fails after retries
    pub async fn fetch_abi(&self, chain: &str, address: &str) -> CdsResult<String> {
        if chain.is_empty() {
            return Err(CdsError::MissingParameter("Blockchain".to_string()));
        }
        if address.is_empty() {
            return Err(CdsError::MissingParameter("Contract address".to_string()));
        }
        let explorer = self
            .config
            .chain(chain)
            .ok_or_else(|| CdsError::UnsupportedChain(chain.to_string()))?;
        let address = normalize_address(address)?;
        let url = Self::build_url(explorer, chain, &address)?;
        debug!(%chain, %address, "fetching ABI");

        let abi = match explorer.api {
            ExplorerApi::Etherscan => self.fetch_etherscan(url).await?,
            ExplorerApi::ContractVerifier => self.fetch_verifier(url).await?,
        };
        info!(%chain, %address, bytes = abi.len(), "fetched ABI");
        Ok(abi)
    }

    /// Fetches and parses the ABI of `address` on `chain`.
    ///
    /// # Errors
    ///
    /// See [`fetch_abi`](Self::fetch_abi); additionally returns
    /// [`CdsError::InvalidAbi`] if the explorer's ABI does not parse.
    pub async fn fetch_abi_entries(&self, chain: &str, address: &str) -> CdsResult<Vec<AbiEntry>> {
        parse_abi_str(&self.fetch_abi(chain, address).await?)
    }

    fn build_url(explorer: &ChainExplorer, chain: &str, address: &str) -> CdsResult<Url> {
        let mut url = explorer.base_url.clone();
        match explorer.api {
            ExplorerApi::Etherscan => {
                let token = explorer.api_token.as_deref().ok_or_else(|| {
                    CdsError::Config(format!("Blockchain API token is missing for {chain}"))
                })?;
                url.query_pairs_mut()
                    .append_pair("module", "contract")
                    .append_pair("action", "getabi")
                    .append_pair("address", address)
                    .append_pair("apikey", token);
            }
            ExplorerApi::ContractVerifier => {
                url.query_pairs_mut().append_pair("contractAddress", address);
            }
        }
        Ok(url)
    }

    async fn fetch_etherscan(&self, url: Url) -> CdsResult<String> {
        let response: EtherscanResponse = self.get_json(url).await?;
        match (response.status.as_str(), response.result) {
            ("1", Value::String(abi)) => Ok(abi),
            (_, Value::String(reason))
                if reason.to_lowercase().contains(ETHERSCAN_RATE_LIMIT_MARKER) =>
            {
                Err(CdsError::RateLimited {
                    retry_after_secs: None,
                })
            }
            (_, Value::String(reason)) => Err(CdsError::api(
                200,
                format!("{}: {reason}", response.message),
            )),
            (_, other) => Err(CdsError::api(
                200,
                format!("{}: unexpected result {other}", response.message),
            )),
        }
    }

    async fn fetch_verifier(&self, url: Url) -> CdsResult<String> {
        let response: VerifierResponse = self.get_json(url).await?;
        match response.abi {
            Some(abi @ Value::Array(_)) => Ok(serde_json::to_string(&abi)?),
            _ => Err(CdsError::api(200, "contract is not verified")),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> CdsResult<T> {
        let client = self.client.clone();
        let max_response_size = self.config.max_response_size();

        // Etherscan reports rate limiting inside a 200 body, so the body is
        // decoded inside the retried operation.
        self.retry
            .execute(|| {
                let client = client.clone();
                let url = url.clone();
                async move {
                    let response = client
                        .get(url)
                        .header(ACCEPT, JSON_CONTENT_TYPE)
                        .send()
                        .await?;
                    Self::handle_response(response, max_response_size).await
                }
            })
            .await
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
        max_response_size: usize,
    ) -> CdsResult<T> {
        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        if status.is_success() {
            let bytes = read_response_bounded(response, max_response_size).await?;
            Ok(serde_json::from_slice(&bytes)?)
        } else if status.as_u16() == 429 {
            Err(CdsError::RateLimited { retry_after_secs })
        } else {
            let body = truncate_error_body(response.text().await.unwrap_or_default());
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            Err(CdsError::api(status.as_u16(), message))
        }
    }
}
