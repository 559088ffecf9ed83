//! Connector Definition Schema document types.
//!
//! These types serialize to the exact JSON shape consumed by the connector
//! runtime: camelCase keys, absent optional fields omitted.

use crate::error::{CdsError, CdsResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Version stamped on every compiled connector.
pub const CDS_VERSION: &str = "1.0.0";
/// Platform version stamped on every compiled connector.
pub const PLATFORM_VERSION: &str = "1.0.0";
/// Connector type for ABI-derived connectors.
pub const WEB3_CONNECTOR_TYPE: &str = "web3";

/// The primitive type of a connector field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Small integers that fit a JSON number without precision loss.
    Number,
    /// `bool`.
    Boolean,
    /// `address`.
    Address,
    /// Everything else, including wide integers and bytes.
    String,
}

impl FieldType {
    /// Returns the JSON name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Address => "address",
            FieldType::String => "string",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An input or output field of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Parameter name (or its positional default).
    pub key: String,
    /// Human-readable label.
    pub label: String,
    /// Primitive type.
    #[serde(rename = "type")]
    pub ty: FieldType,
    /// Input hint; empty for non-address fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Whether the field holds a list of values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<bool>,
    /// Set on action inputs only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Written by enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

/// Display information of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    /// UI label.
    pub label: String,
    /// UI description.
    pub description: String,
}

/// Whether an operation listens to events or calls functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    /// A contract event.
    #[serde(rename = "blockchain:event")]
    Event,
    /// A contract function call.
    #[serde(rename = "blockchain:call")]
    Call,
}

/// The executable part of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSpec {
    /// Operation type.
    #[serde(rename = "type")]
    pub ty: OperationType,
    /// Solidity-like signature.
    pub signature: String,
    /// Ordered input fields.
    pub input_fields: Vec<Field>,
    /// Ordered output fields.
    pub output_fields: Vec<Field>,
    /// Sample output; always empty.
    #[serde(default)]
    pub sample: serde_json::Map<String, serde_json::Value>,
}

/// A trigger or an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation key, unique within its list.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Display information.
    pub display: Display,
    /// Executable description.
    pub operation: OperationSpec,
}

impl Operation {
    /// Returns the operation signature.
    pub fn signature(&self) -> &str {
        &self.operation.signature
    }

    /// Returns the input fields.
    pub fn input_fields(&self) -> &[Field] {
        &self.operation.input_fields
    }
}

/// A compiled connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorDocument {
    /// URL-safe connector key.
    pub key: String,
    /// Connector name.
    pub name: String,
    /// CDS version.
    pub version: String,
    /// Platform version.
    pub platform_version: String,
    /// Connector type.
    #[serde(rename = "type")]
    pub ty: String,
    /// Connector description.
    #[serde(default)]
    pub description: String,
    /// Icon as a data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Operations derived from events.
    #[serde(default)]
    pub triggers: Vec<Operation>,
    /// Operations derived from functions.
    #[serde(default)]
    pub actions: Vec<Operation>,
}

static CLONE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"_clone_[0-9]+$").unwrap());

impl ConnectorDocument {
    /// Returns every trigger and action signature, triggers first.
    pub fn signatures(&self) -> impl Iterator<Item = &str> {
        self.triggers
            .iter()
            .chain(self.actions.iter())
            .map(Operation::signature)
    }

    /// Derives a clone of this connector stamped with `unix_secs`.
    ///
    /// The key gets a `_clone_<unix_secs>` suffix, replacing any earlier
    /// clone suffix, and the name gets a `" clone"` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::MissingParameter`] if the connector has no name.
    pub fn clone_at(&self, unix_secs: u64) -> CdsResult<Self> {
        if self.name.is_empty() {
            return Err(CdsError::MissingParameter("Connector name".to_string()));
        }
        let suffix = format!("_clone_{unix_secs}");
        let key = if CLONE_SUFFIX.is_match(&self.key) {
            CLONE_SUFFIX.replace(&self.key, suffix.as_str()).into_owned()
        } else {
            format!("{}{suffix}", self.key)
        };
        Ok(Self {
            key,
            name: format!("{} clone", self.name),
            ..self.clone()
        })
    }
}
