//! Positional merge of completion results into compiled operations.

use crate::cds::Operation;
use serde::{Deserialize, Serialize};

/// Generated text for one operation.
///
/// Every part is optional: the completion may skip an operation, its
/// description, or some of its inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResult {
    /// Replacement for `display.description`.
    #[serde(default)]
    pub description: Option<String>,
    /// One helper text per input field, in input order.
    #[serde(default)]
    pub helper_text_inputs: Option<Vec<Option<String>>>,
}

impl EnrichmentResult {
    /// Creates a result carrying only a description.
    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            helper_text_inputs: None,
        }
    }

    /// Creates a result carrying only helper texts.
    pub fn with_helper_texts<I, S>(helpers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            description: None,
            helper_text_inputs: Some(helpers.into_iter().map(|h| Some(h.into())).collect()),
        }
    }
}

/// The `{ result: [...] }` object returned for one batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct BatchResponse {
    #[serde(default)]
    pub(crate) result: Vec<Option<EnrichmentResult>>,
}

/// The `{ description }` object returned for the connector description.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DescriptionResponse {
    #[serde(default)]
    pub(crate) description: Option<String>,
}

fn non_empty(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|text| !text.is_empty())
}

/// Pads with absent entries, or truncates, so that `results` is exactly
/// `width` long.
pub fn align_batch(
    mut results: Vec<Option<EnrichmentResult>>,
    width: usize,
) -> Vec<Option<EnrichmentResult>> {
    results.resize(width, None);
    results
}

/// Merges `results` into `operations` by position.
///
/// Only `display.description` and input `helpText` are written, and only
/// from non-empty values. Missing results, missing helper texts and extra
/// entries leave the operations untouched.
pub fn merge_enrichment(operations: &mut [Operation], results: &[Option<EnrichmentResult>]) {
    for (operation, result) in operations.iter_mut().zip(results) {
        let Some(result) = result else {
            continue;
        };
        if let Some(description) = non_empty(&result.description) {
            operation.display.description = description.to_string();
        }
        if let Some(helpers) = &result.helper_text_inputs {
            for (field, helper) in operation.operation.input_fields.iter_mut().zip(helpers) {
                if let Some(helper) = non_empty(helper) {
                    field.help_text = Some(helper.to_string());
                }
            }
        }
    }
}
