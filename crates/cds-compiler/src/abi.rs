//! Smart-contract ABI types.
//!
//! Only the subset of the Solidity JSON ABI that the compiler reads is
//! modelled here. Unknown keys are ignored, and [`parse_abi`] keeps only
//! `function` and `event` entries; everything else in the array is skipped
//! without being looked at.

use crate::error::{CdsError, CdsResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Reads an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The `type` of an ABI entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbiEntryKind {
    /// A callable contract function.
    Function,
    /// An event emitted by the contract.
    Event,
    /// The contract constructor.
    Constructor,
    /// The fallback function.
    Fallback,
    /// The receive-ether function.
    Receive,
    /// A custom error.
    Error,
    /// Anything else, including a missing `type` key.
    #[default]
    #[serde(other)]
    Unknown,
}

/// A single input or output parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    /// Parameter name. Empty or absent for unnamed parameters.
    #[serde(default)]
    pub name: Option<String>,
    /// Solidity type, e.g. `uint256` or `address[]`.
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether an event parameter is indexed.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub indexed: bool,
}

impl AbiParam {
    /// Creates a named parameter.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ty: ty.into(),
            indexed: false,
        }
    }

    /// Marks the parameter as indexed.
    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Returns the parameter name, or `""` when unnamed.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Returns the parameter name, defaulting unnamed parameters to
    /// `"param" + index`.
    pub fn name_or_default(&self, index: usize) -> String {
        match self.name() {
            "" => format!("param{index}"),
            name => name.to_string(),
        }
    }
}

/// One element of a contract ABI array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiEntry {
    /// The entry type.
    #[serde(rename = "type", default)]
    pub kind: AbiEntryKind,
    /// Function or event name.
    #[serde(default)]
    pub name: Option<String>,
    /// Ordered inputs. Order determines positional binding at call time.
    #[serde(default, deserialize_with = "null_as_default")]
    pub inputs: Vec<AbiParam>,
    /// Ordered outputs (functions only).
    #[serde(default, deserialize_with = "null_as_default")]
    pub outputs: Vec<AbiParam>,
    /// Legacy `constant` flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<bool>,
    /// Legacy `payable` flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payable: Option<bool>,
    /// `pure`, `view`, `nonpayable` or `payable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<String>,
}

impl AbiEntry {
    /// Creates a function entry with no parameters.
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            kind: AbiEntryKind::Function,
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Creates an event entry with no parameters.
    pub fn event(name: impl Into<String>) -> Self {
        Self {
            kind: AbiEntryKind::Event,
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Appends an input parameter.
    #[must_use]
    pub fn with_input(mut self, param: AbiParam) -> Self {
        self.inputs.push(param);
        self
    }

    /// Appends an output type.
    #[must_use]
    pub fn with_output(mut self, ty: impl Into<String>) -> Self {
        self.outputs.push(AbiParam {
            name: None,
            ty: ty.into(),
            indexed: false,
        });
        self
    }

    /// Sets the legacy `constant` flag.
    #[must_use]
    pub fn with_constant(mut self, constant: bool) -> Self {
        self.constant = Some(constant);
        self
    }

    /// Sets the legacy `payable` flag.
    #[must_use]
    pub fn with_payable(mut self, payable: bool) -> Self {
        self.payable = Some(payable);
        self
    }

    /// Sets the state mutability.
    #[must_use]
    pub fn with_state_mutability(mut self, mutability: impl Into<String>) -> Self {
        self.state_mutability = Some(mutability.into());
        self
    }

    /// Returns the entry name, or `""` when absent.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Whether the entry is flagged `constant`.
    pub fn is_constant(&self) -> bool {
        self.constant.unwrap_or(false)
    }

    /// Whether the entry is flagged `payable`.
    pub fn is_payable(&self) -> bool {
        self.payable.unwrap_or(false)
    }

    /// Whether the state mutability is `pure`.
    pub fn is_pure(&self) -> bool {
        self.state_mutability.as_deref() == Some("pure")
    }

    /// Returns a copy with every unnamed input renamed to `"param" + index`.
    pub fn with_default_param_names(&self) -> Self {
        let inputs = self
            .inputs
            .iter()
            .enumerate()
            .map(|(index, input)| AbiParam {
                name: Some(input.name_or_default(index)),
                ..input.clone()
            })
            .collect();
        Self {
            inputs,
            ..self.clone()
        }
    }
}

/// Parses an ABI given either as an already-parsed JSON array or as a JSON
/// string holding one, keeping its `function` and `event` entries in order.
///
/// Elements of any other `type`, elements without a `type`, and elements
/// that are not objects are dropped without error.
///
/// # Errors
///
/// Returns [`CdsError::InvalidAbi`] if the string is not valid JSON, if the
/// value is not an array, or if a `function` or `event` entry is malformed
/// (for example, a parameter without a `type`).
pub fn parse_abi(value: &Value) -> CdsResult<Vec<AbiEntry>> {
    match value {
        Value::String(raw) => parse_abi_str(raw),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter(|(_, item)| is_compiled_kind(item))
            .map(|(index, item)| {
                AbiEntry::deserialize(item)
                    .map_err(|e| CdsError::invalid_abi(format!("entry {index}: {e}")))
            })
            .collect(),
        other => Err(CdsError::invalid_abi(format!(
            "expected a JSON array, got {}",
            json_kind(other)
        ))),
    }
}

/// Parses an ABI from its JSON text.
///
/// # Errors
///
/// See [`parse_abi`].
pub fn parse_abi_str(raw: &str) -> CdsResult<Vec<AbiEntry>> {
    let value: Value = serde_json::from_str(raw).map_err(|e| CdsError::invalid_abi(e.to_string()))?;
    match value {
        Value::String(_) => Err(CdsError::invalid_abi("expected a JSON array, got string")),
        value => parse_abi(&value),
    }
}

fn is_compiled_kind(item: &Value) -> bool {
    matches!(
        item.get("type").and_then(Value::as_str),
        Some("function" | "event")
    )
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
