//! Configuration for enrichment and the ABI explorer client.

use crate::error::{CdsError, CdsResult};
use crate::retry::RetryConfig;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Default number of operations sent per completion call.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Default maximum explorer response body size: 5 MB.
const DEFAULT_MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024;

/// Validates that a URL uses `http` or `https`.
///
/// # Errors
///
/// Returns [`CdsError::Config`] for any other scheme.
pub fn validate_url_scheme(url: &Url) -> CdsResult<()> {
    match url.scheme() {
        "https" | "http" => Ok(()),
        scheme => Err(CdsError::Config(format!(
            "unsupported URL scheme '{scheme}': only 'http' and 'https' are allowed"
        ))),
    }
}

/// Configuration of the enrichment pass.
///
/// # Example
///
/// ```rust
/// use cds_compiler::config::EnrichmentConfig;
///
/// let config = EnrichmentConfig::builder().batch_size(10).build().unwrap();
/// assert_eq!(config.batch_size(), 10);
///
/// assert!(EnrichmentConfig::builder().batch_size(0).build().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentConfig {
    batch_size: usize,
    describe_connector: bool,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            describe_connector: true,
        }
    }
}

impl EnrichmentConfig {
    /// Creates a new builder.
    pub fn builder() -> EnrichmentConfigBuilder {
        EnrichmentConfigBuilder::default()
    }

    /// Returns a copy using `batch_size` operations per completion call.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::Config`] if `batch_size` is zero.
    pub fn with_batch_size(&self, batch_size: usize) -> CdsResult<Self> {
        validate_batch_size(batch_size)?;
        Ok(Self {
            batch_size,
            ..self.clone()
        })
    }

    /// Operations per completion call.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Whether a whole-connector description is requested after the batches.
    pub fn describe_connector(&self) -> bool {
        self.describe_connector
    }
}

fn validate_batch_size(batch_size: usize) -> CdsResult<()> {
    if batch_size == 0 {
        return Err(CdsError::Config(
            "enrichment batch size must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Builder for [`EnrichmentConfig`].
#[derive(Debug, Clone, Default)]
pub struct EnrichmentConfigBuilder {
    batch_size: Option<usize>,
    describe_connector: Option<bool>,
}

impl EnrichmentConfigBuilder {
    /// Sets the number of operations per completion call.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Enables or disables the whole-connector description call.
    #[must_use]
    pub fn describe_connector(mut self, enabled: bool) -> Self {
        self.describe_connector = Some(enabled);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::Config`] if the batch size is zero.
    pub fn build(self) -> CdsResult<EnrichmentConfig> {
        let default = EnrichmentConfig::default();
        let batch_size = self.batch_size.unwrap_or(default.batch_size);
        validate_batch_size(batch_size)?;
        Ok(EnrichmentConfig {
            batch_size,
            describe_connector: self.describe_connector.unwrap_or(default.describe_connector),
        })
    }
}

/// How an explorer exposes verified ABIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExplorerApi {
    /// `?module=contract&action=getabi&address=..&apikey=..`, answering
    /// `{ status, message, result }`.
    Etherscan,
    /// `?contractAddress=..`, answering `{ abi }`.
    ContractVerifier,
}

/// Explorer endpoint for one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainExplorer {
    /// API flavour.
    pub api: ExplorerApi,
    /// Endpoint URL, without query parameters.
    pub base_url: Url,
    /// API token, when the explorer needs one.
    pub api_token: Option<String>,
}

impl ChainExplorer {
    /// Creates an Etherscan-style endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid `http(s)` URL.
    pub fn etherscan(base_url: &str, api_token: Option<String>) -> CdsResult<Self> {
        let base_url = Url::parse(base_url)?;
        validate_url_scheme(&base_url)?;
        Ok(Self {
            api: ExplorerApi::Etherscan,
            base_url,
            api_token,
        })
    }

    /// Creates a contract-verifier endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid `http(s)` URL.
    pub fn contract_verifier(base_url: &str) -> CdsResult<Self> {
        let base_url = Url::parse(base_url)?;
        validate_url_scheme(&base_url)?;
        Ok(Self {
            api: ExplorerApi::ContractVerifier,
            base_url,
            api_token: None,
        })
    }
}

/// Ethereum mainnet.
pub const ETHEREUM_MAINNET: &str = "eip155:1";
/// Polygon PoS.
pub const POLYGON_MAINNET: &str = "eip155:137";
/// Gnosis chain.
pub const GNOSIS_MAINNET: &str = "eip155:100";
/// Harmony shard 0.
pub const HARMONY_MAINNET: &str = "eip155:1666600000";

/// Configuration of the ABI explorer client.
///
/// # Example
///
/// ```rust
/// use cds_compiler::config::ExplorerConfig;
/// use cds_compiler::retry::RetryConfig;
///
/// let config = ExplorerConfig::from_env()
///     .with_timeout(std::time::Duration::from_secs(5))
///     .with_retry(RetryConfig::no_retry());
/// assert!(config.chain("eip155:1").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    chains: BTreeMap<String, ChainExplorer>,
    timeout: Duration,
    retry_config: RetryConfig,
    max_response_size: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            chains: BTreeMap::new(),
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::conservative(),
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }
}

impl ExplorerConfig {
    /// Creates a configuration with no chains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the built-in chain table, reading API tokens from
    /// `ETHERSCAN_API_TOKEN`, `POLYGONSCAN_API_TOKEN` and `BLOCKSCOUT_API_TOKEN`.
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn from_env() -> Self {
        let token = |name: &str| std::env::var(name).ok().filter(|t| !t.is_empty());
        // The URLs are constants, so the constructors cannot fail.
        let chains = [
            (
                ETHEREUM_MAINNET,
                ChainExplorer::etherscan("https://api.etherscan.io/api", token("ETHERSCAN_API_TOKEN")),
            ),
            (
                POLYGON_MAINNET,
                ChainExplorer::etherscan(
                    "https://api.polygonscan.com/api",
                    token("POLYGONSCAN_API_TOKEN"),
                ),
            ),
            (
                GNOSIS_MAINNET,
                ChainExplorer::etherscan(
                    "https://blockscout.com/xdai/mainnet/api",
                    token("BLOCKSCOUT_API_TOKEN"),
                ),
            ),
            (
                HARMONY_MAINNET,
                ChainExplorer::contract_verifier("https://ctrver.t.hmny.io/fetchContractCode"),
            ),
        ];

        let mut config = Self::default();
        for (chain, explorer) in chains {
            config = config.with_chain(chain, explorer.expect("valid explorer URL"));
        }
        config
    }

    /// Adds or replaces the explorer of `chain`.
    #[must_use]
    pub fn with_chain(mut self, chain: impl Into<String>, explorer: ChainExplorer) -> Self {
        self.chains.insert(chain.into(), explorer);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Disables retries.
    #[must_use]
    pub fn without_retry(mut self) -> Self {
        self.retry_config = RetryConfig::no_retry();
        self
    }

    /// Sets the maximum accepted response body size in bytes.
    #[must_use]
    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }

    /// Returns the explorer of `chain`, if configured.
    pub fn chain(&self, chain: &str) -> Option<&ChainExplorer> {
        self.chains.get(chain)
    }

    /// Returns the configured chain ids, sorted.
    pub fn chains(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    /// Returns the maximum accepted response body size.
    pub fn max_response_size(&self) -> usize {
        self.max_response_size
    }
}
