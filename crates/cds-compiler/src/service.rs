//! Request-level orchestration: ABI in, connector document out.

use crate::abi::parse_abi;
use crate::cds::ConnectorDocument;
use crate::compiler::{connector_key, ConnectorCompiler, ConnectorMeta};
use crate::config::EnrichmentConfig;
use crate::enrich::{Enricher, StructuredCompletion};
use crate::error::{CdsError, CdsResult};
use crate::external::{resolve_icon, IconResolver, KeyRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// A convert request, as posted by the connector editor.
///
/// # Example
///
/// ```rust
/// use cds_compiler::service::ConvertRequest;
///
/// let request: ConvertRequest = serde_json::from_str(
///     r#"{"abi": "[]", "name": "My Token", "enhancedByOpenAI": true, "batchSizeOpenAI": 5}"#,
/// )
/// .unwrap();
/// assert!(request.enhanced);
/// assert_eq!(request.batch_size, Some(5));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    /// The ABI, as a JSON array or a string holding one.
    #[serde(default)]
    pub abi: Value,
    /// Connector name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Icon, either a `data:` URI or an `http(s)` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Connector description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether to run the enrichment pass.
    #[serde(default, rename = "enhancedByOpenAI")]
    pub enhanced: bool,
    /// Operations per completion call, overriding the configured default.
    #[serde(default, rename = "batchSizeOpenAI", skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

impl ConvertRequest {
    /// Creates a request for `abi` with no metadata.
    pub fn new(abi: impl Into<Value>) -> Self {
        Self {
            abi: abi.into(),
            ..Default::default()
        }
    }

    /// Sets the connector name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the icon.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Requests enrichment, optionally with a batch size.
    #[must_use]
    pub fn enhanced(mut self, batch_size: Option<usize>) -> Self {
        self.enhanced = true;
        self.batch_size = batch_size;
        self
    }

    fn meta(&self) -> ConnectorMeta {
        ConnectorMeta {
            name: self.name.clone(),
            icon: self.icon.clone(),
            description: self.description.clone(),
        }
    }
}

/// Compiles convert requests against shared collaborators.
///
/// The service holds no per-request state and can be shared across tasks.
#[derive(Clone)]
pub struct ConnectorService {
    registry: Arc<dyn KeyRegistry>,
    icons: Arc<dyn IconResolver>,
    completion: Option<Arc<dyn StructuredCompletion>>,
    enrichment: EnrichmentConfig,
}

impl std::fmt::Debug for ConnectorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorService")
            .field("completion", &self.completion.is_some())
            .field("enrichment", &self.enrichment)
            .finish_non_exhaustive()
    }
}

impl ConnectorService {
    /// Creates a service without a completion capability.
    pub fn new(registry: Arc<dyn KeyRegistry>, icons: Arc<dyn IconResolver>) -> Self {
        Self {
            registry,
            icons,
            completion: None,
            enrichment: EnrichmentConfig::default(),
        }
    }

    /// Sets the completion capability used for enriched requests.
    #[must_use]
    pub fn with_completion(mut self, completion: Arc<dyn StructuredCompletion>) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Sets the default enrichment configuration.
    #[must_use]
    pub fn with_enrichment_config(mut self, config: EnrichmentConfig) -> Self {
        self.enrichment = config;
        self
    }

    /// Compiles `request` into a connector document.
    ///
    /// Runs, in order: ABI parsing, key derivation, the duplicate-key
    /// check, compilation, icon resolution, then enrichment if requested.
    ///
    /// # Errors
    ///
    /// - [`CdsError::InvalidAbi`] if the ABI is not a JSON array of entries
    /// - [`CdsError::DuplicateKey`] if the derived key is taken
    /// - [`CdsError::IconResolution`] if an icon URL cannot be resolved
    /// - [`CdsError::Config`] if the requested batch size is zero
    /// - [`CdsError::Enrichment`] if enrichment fails or no completion
    ///   capability is configured
    pub async fn convert(&self, request: ConvertRequest) -> CdsResult<ConnectorDocument> {
        let abi = parse_abi(&request.abi)?;
        let meta = request.meta();
        let key = connector_key(&meta);
        debug!(%key, entries = abi.len(), "converting ABI");

        if self.registry.key_exists(&key).await? {
            return Err(CdsError::duplicate_key(key));
        }

        let mut document = ConnectorCompiler::new(&abi, &meta).with_key(key).compile();
        document.icon = resolve_icon(meta.icon.as_deref(), self.icons.as_ref()).await?;

        if request.enhanced {
            let config = match request.batch_size {
                Some(batch_size) => self.enrichment.with_batch_size(batch_size)?,
                None => self.enrichment.clone(),
            };
            let completion = self.completion.clone().ok_or_else(|| {
                CdsError::enrichment("no structured completion capability is configured")
            })?;
            document = Enricher::new(completion, config).enrich(document).await?;
        }

        info!(
            key = %document.key,
            triggers = document.triggers.len(),
            actions = document.actions.len(),
            enhanced = request.enhanced,
            "converted ABI"
        );
        Ok(document)
    }

    /// Derives a clone of `document` stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::MissingParameter`] if the connector has no name.
    pub fn clone_connector(&self, document: &ConnectorDocument) -> CdsResult<ConnectorDocument> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| CdsError::Internal(format!("system clock before unix epoch: {e}")))?;
        document.clone_at(now.as_secs())
    }
}
