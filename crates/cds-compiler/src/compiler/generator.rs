//! Connector generator: compiles an ABI into a [`ConnectorDocument`].

use crate::abi::{parse_abi, AbiEntry, AbiEntryKind};
use crate::cds::{
    ConnectorDocument, Display, Field, Operation, OperationSpec, OperationType, CDS_VERSION,
    PLATFORM_VERSION, WEB3_CONNECTOR_TYPE,
};
use crate::compiler::naming::{humanize, slugify};
use crate::compiler::signature::{event_signature, function_signature};
use crate::compiler::types::{abi_input_to_field, return_value_field};
use crate::error::CdsResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Suffix appended to the label of `constant` functions.
pub const VIEW_FUNCTION_SUFFIX: &str = " (View function)";

const TRIGGER_KEY_SUFFIX: &str = "Trigger";
const ACTION_KEY_SUFFIX: &str = "Action";

/// Caller-supplied connector metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorMeta {
    /// Connector name; the key is derived from it.
    #[serde(default)]
    pub name: Option<String>,
    /// Icon, either a `data:` URI or an `http(s)` URL.
    #[serde(default)]
    pub icon: Option<String>,
    /// Connector description.
    #[serde(default)]
    pub description: Option<String>,
}

impl ConnectorMeta {
    /// Creates metadata with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
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
}

/// Derives the connector key from the metadata name, falling back to a
/// timestamp-based key when there is no usable name.
pub fn connector_key(meta: &ConnectorMeta) -> String {
    meta.name
        .as_deref()
        .map(slugify)
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| default_key(SystemTime::now()))
}

/// Returns `connector-<unix millis>` for `now`.
pub fn default_key(now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("connector-{millis}")
}

/// Hands out operation keys, disambiguating overloaded names.
///
/// The first `transfer` function gets `transferAction`; later overloads get
/// the smallest `_<n>` suffix, `n >= 2`, that is still free
/// (`transfer_2Action`, ...), so they never read as a name ending in digits.
#[derive(Debug, Default)]
struct KeyAllocator {
    used: HashSet<String>,
}

impl KeyAllocator {
    fn allocate(&mut self, raw_name: &str, suffix: &str) -> String {
        let mut key = format!("{raw_name}{suffix}");
        let mut n = 2;
        while self.used.contains(&key) {
            key = format!("{raw_name}_{n}{suffix}");
            n += 1;
        }
        self.used.insert(key.clone());
        key
    }
}

/// Compiles ABI entries into a connector document.
///
/// Compilation is pure: the same entries, metadata and key always produce
/// the same document.
#[derive(Debug)]
pub struct ConnectorCompiler<'a> {
    abi: &'a [AbiEntry],
    meta: &'a ConnectorMeta,
    key: Option<String>,
}

impl<'a> ConnectorCompiler<'a> {
    /// Creates a compiler for the given entries and metadata.
    #[must_use]
    pub fn new(abi: &'a [AbiEntry], meta: &'a ConnectorMeta) -> Self {
        Self {
            abi,
            meta,
            key: None,
        }
    }

    /// Uses a precomputed connector key instead of deriving one.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Builds the connector document.
    pub fn compile(&self) -> ConnectorDocument {
        let key = self
            .key
            .clone()
            .unwrap_or_else(|| connector_key(self.meta));

        let mut trigger_keys = KeyAllocator::default();
        let triggers: Vec<_> = self
            .entries_of(AbiEntryKind::Event)
            .map(|entry| {
                let key = trigger_keys.allocate(entry.name(), TRIGGER_KEY_SUFFIX);
                build_trigger(entry, key)
            })
            .collect();

        let mut action_keys = KeyAllocator::default();
        let actions: Vec<_> = self
            .entries_of(AbiEntryKind::Function)
            .map(|entry| {
                let key = action_keys.allocate(entry.name(), ACTION_KEY_SUFFIX);
                build_action(entry, key)
            })
            .collect();

        debug!(
            key = %key,
            entries = self.abi.len(),
            triggers = triggers.len(),
            actions = actions.len(),
            "compiled connector"
        );

        ConnectorDocument {
            key,
            name: self.meta.name.clone().unwrap_or_default(),
            version: CDS_VERSION.to_string(),
            platform_version: PLATFORM_VERSION.to_string(),
            ty: WEB3_CONNECTOR_TYPE.to_string(),
            description: self.meta.description.clone().unwrap_or_default(),
            icon: self.meta.icon.clone(),
            triggers,
            actions,
        }
    }

    fn entries_of(&self, kind: AbiEntryKind) -> impl Iterator<Item = &'a AbiEntry> {
        self.abi.iter().filter(move |entry| entry.kind == kind)
    }
}

/// Parses `raw_abi` (a JSON array or a JSON string holding one) and compiles
/// it with `meta`.
///
/// # Errors
///
/// Returns [`CdsError::InvalidAbi`](crate::error::CdsError::InvalidAbi) if
/// the ABI cannot be parsed. Nothing else fails.
pub fn compile(raw_abi: &Value, meta: &ConnectorMeta) -> CdsResult<ConnectorDocument> {
    let abi = parse_abi(raw_abi)?;
    Ok(ConnectorCompiler::new(&abi, meta).compile())
}

fn input_fields(entry: &AbiEntry) -> Vec<Field> {
    entry
        .inputs
        .iter()
        .enumerate()
        .map(|(index, input)| abi_input_to_field(input, index))
        .collect()
}

fn build_trigger(entry: &AbiEntry, key: String) -> Operation {
    let entry = entry.with_default_param_names();
    let label = humanize(entry.name());
    let fields = input_fields(&entry);

    Operation {
        key,
        name: label.clone(),
        display: Display {
            label: label.clone(),
            description: label,
        },
        operation: OperationSpec {
            ty: OperationType::Event,
            signature: event_signature(&entry),
            input_fields: fields.clone(),
            output_fields: fields,
            sample: Default::default(),
        },
    }
}

fn build_action(entry: &AbiEntry, key: String) -> Operation {
    let entry = entry.with_default_param_names();
    let mut label = humanize(entry.name());
    if entry.is_constant() {
        label.push_str(VIEW_FUNCTION_SUFFIX);
    }

    let input_fields = input_fields(&entry)
        .into_iter()
        .map(|field| Field {
            required: Some(true),
            ..field
        })
        .collect();

    let output_fields = match entry.outputs.as_slice() {
        [output] if entry.is_constant() || entry.is_pure() => {
            vec![return_value_field(entry.name(), &output.ty)]
        }
        _ => vec![],
    };

    Operation {
        key,
        name: label.clone(),
        display: Display {
            label: label.clone(),
            description: label,
        },
        operation: OperationSpec {
            ty: OperationType::Call,
            signature: function_signature(&entry),
            input_fields,
            output_fields,
            sample: Default::default(),
        },
    }
}
