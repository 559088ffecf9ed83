//! Optional enrichment of compiled connectors with generated text.
//!
//! # Overview
//!
//! The [`Enricher`] sends the triggers, then the actions, to a
//! [`StructuredCompletion`] in fixed-size batches, one call at a time, and
//! merges the returned descriptions and helper texts back by position. A
//! final call may describe the whole connector.
//!
//! Any failed call aborts enrichment; the document is consumed, so no
//! partially enriched connector escapes.
//!
//! # Example
//!
//! ```rust,ignore
//! use cds_compiler::enrich::Enricher;
//! use cds_compiler::config::EnrichmentConfig;
//!
//! let enricher = Enricher::new(completion, EnrichmentConfig::default());
//! let document = enricher.enrich(document).await?;
//! ```

mod completion;
mod merge;
mod prompt;

pub use completion::{ResponseSchema, StructuredCompletion};
pub use merge::{align_batch, merge_enrichment, EnrichmentResult};
pub use prompt::{
    description_prompt, description_schema, operations_prompt, operations_schema, OperationKind,
};

use crate::cds::{ConnectorDocument, Operation};
use crate::config::EnrichmentConfig;
use crate::error::{CdsError, CdsResult};
use merge::{BatchResponse, DescriptionResponse};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs the enrichment pass against a completion capability.
#[derive(Clone)]
pub struct Enricher {
    completion: Arc<dyn StructuredCompletion>,
    config: EnrichmentConfig,
}

impl std::fmt::Debug for Enricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enricher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Enricher {
    /// Creates an enricher.
    pub fn new(completion: Arc<dyn StructuredCompletion>, config: EnrichmentConfig) -> Self {
        Self { completion, config }
    }

    /// Returns the enrichment configuration.
    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    /// Enriches `document` and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::Enrichment`] if any completion call fails, returns
    /// a malformed object, or the collected results do not line up with the
    /// operations.
    pub async fn enrich(&self, mut document: ConnectorDocument) -> CdsResult<ConnectorDocument> {
        info!(
            key = %document.key,
            triggers = document.triggers.len(),
            actions = document.actions.len(),
            batch_size = self.config.batch_size(),
            "enriching connector"
        );

        let results = self
            .collect_results(OperationKind::Trigger, &document.name, &document.triggers)
            .await?;
        merge_enrichment(&mut document.triggers, &results);

        let results = self
            .collect_results(OperationKind::Action, &document.name, &document.actions)
            .await?;
        merge_enrichment(&mut document.actions, &results);

        if self.config.describe_connector() {
            if let Some(description) = self.describe(&document).await? {
                document.description = description;
            }
        }

        Ok(document)
    }

    async fn collect_results(
        &self,
        kind: OperationKind,
        connector_name: &str,
        operations: &[Operation],
    ) -> CdsResult<Vec<Option<EnrichmentResult>>> {
        let schema = operations_schema(kind);
        let mut results = Vec::with_capacity(operations.len());

        for (index, batch) in operations.chunks(self.config.batch_size()).enumerate() {
            debug!(%kind, batch = index, width = batch.len(), "requesting batch");
            let prompt = operations_prompt(kind, connector_name, batch);
            let value = self
                .completion
                .complete_structured(&prompt, &schema)
                .await
                .map_err(|e| CdsError::enrichment(format!("{kind} batch {index}: {e:#}")))?;
            let response: BatchResponse = serde_json::from_value(value).map_err(|e| {
                CdsError::enrichment(format!("{kind} batch {index}: malformed response: {e}"))
            })?;

            if response.result.len() != batch.len() {
                warn!(
                    %kind,
                    batch = index,
                    expected = batch.len(),
                    received = response.result.len(),
                    "completion returned a misaligned batch"
                );
            }
            results.extend(align_batch(response.result, batch.len()));
        }

        if results.len() != operations.len() {
            return Err(CdsError::enrichment(format!(
                "{kind}: collected {} results for {} operations",
                results.len(),
                operations.len()
            )));
        }
        Ok(results)
    }

    async fn describe(&self, document: &ConnectorDocument) -> CdsResult<Option<String>> {
        let value = self
            .completion
            .complete_structured(&description_prompt(document), &description_schema())
            .await
            .map_err(|e| CdsError::enrichment(format!("connector description: {e:#}")))?;
        let response: DescriptionResponse = serde_json::from_value(value).map_err(|e| {
            CdsError::enrichment(format!("connector description: malformed response: {e}"))
        })?;
        Ok(response.description.filter(|d| !d.is_empty()))
    }
}
