//! Prompts and response schemas sent to the completion capability.

use crate::cds::{ConnectorDocument, Operation};
use crate::enrich::completion::ResponseSchema;
use serde_json::{json, Value};

/// Which operation list a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Event-derived operations.
    Trigger,
    /// Function-derived operations.
    Action,
}

impl OperationKind {
    /// Returns the plural noun used in prompts and logs.
    pub fn plural(&self) -> &'static str {
        match self {
            OperationKind::Trigger => "triggers",
            OperationKind::Action => "actions",
        }
    }

    fn item_description(&self) -> &'static str {
        match self {
            OperationKind::Trigger => "description for the trigger",
            OperationKind::Action => "description for the action/function",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.plural())
    }
}

/// Schema for a batch of operations:
/// `{ result: [{ description, helperTextInputs: [string] }] }`.
pub fn operations_schema(kind: OperationKind) -> ResponseSchema {
    ResponseSchema {
        name: format!("describe_{}", kind.plural()),
        description: format!(
            "Return one entry per {} with a description and a helper text per input",
            kind.plural().trim_end_matches('s')
        ),
        parameters: json!({
            "type": "object",
            "properties": {
                "result": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "description": {
                                "type": "string",
                                "description": kind.item_description()
                            },
                            "helperTextInputs": {
                                "type": "array",
                                "items": {
                                    "type": "string",
                                    "description": "helper text for the user"
                                }
                            }
                        }
                    }
                }
            }
        }),
    }
}

/// Schema for the whole-connector description: `{ description }`.
pub fn description_schema() -> ResponseSchema {
    ResponseSchema {
        name: "describe_connector".to_string(),
        description: "Return a global description of the connector".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "description": {
                    "type": "string",
                    "description": "global description of the connector"
                }
            }
        }),
    }
}

fn operation_summary(operation: &Operation) -> Value {
    json!({
        "name": operation.name,
        "signature": operation.signature(),
        "inputs": operation
            .input_fields()
            .iter()
            .map(|field| field.key.as_str())
            .collect::<Vec<_>>(),
    })
}

/// Builds the prompt for one batch of operations.
///
/// The model is asked for exactly one result per operation, in order, and
/// one helper text per input.
pub fn operations_prompt(kind: OperationKind, connector_name: &str, batch: &[Operation]) -> String {
    let summaries: Vec<Value> = batch.iter().map(operation_summary).collect();
    format!(
        "You are documenting the {kind} of the smart contract connector \"{connector_name}\".\n\
         For each of the {count} {kind} below, in the same order, write a short user-facing \
         description and one short helper text per input, in input order.\n\
         Return exactly {count} results.\n\n{operations}",
        count = batch.len(),
        operations = Value::Array(summaries),
    )
}

/// Builds the prompt for the whole-connector description.
pub fn description_prompt(document: &ConnectorDocument) -> String {
    let signatures: Vec<&str> = document.signatures().collect();
    format!(
        "Write a short user-facing description of the smart contract connector \"{}\".\n\
         Its operations are:\n{}",
        document.name,
        signatures.join("\n")
    )
}
