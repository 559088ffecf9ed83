//! ABI to connector compilation.
//!
//! This module turns a parsed contract ABI into a [`ConnectorDocument`]
//! without any I/O.
//!
//! # Overview
//!
//! The compiler:
//! - Maps each `event` entry to a trigger and each `function` entry to an action
//! - Humanizes identifiers into labels ([`humanize`])
//! - Maps Solidity types onto connector field types ([`map_type`])
//! - Renders Solidity-like signatures ([`build_signature`])
//!
//! # Example
//!
//! ```rust,ignore
//! use cds_compiler::compiler::{compile, ConnectorMeta};
//!
//! let abi_json = std::fs::read_to_string("erc20.json")?;
//! let abi: serde_json::Value = serde_json::from_str(&abi_json)?;
//!
//! let doc = compile(&abi, &ConnectorMeta::named("My Token"))?;
//! assert_eq!(doc.key, "my-token");
//! ```
//!
//! [`ConnectorDocument`]: crate::cds::ConnectorDocument

mod generator;
mod naming;
mod signature;
mod types;

pub use generator::{
    compile, connector_key, default_key, ConnectorCompiler, ConnectorMeta, VIEW_FUNCTION_SUFFIX,
};
pub use naming::{humanize, humanize_steps, slugify, split_words, HumanizeStep};
pub use signature::{build_signature, event_signature, function_signature, function_suffix};
pub use types::{
    abi_input_to_field, is_list_type, map_type, return_value_field, to_field, ADDRESS_PLACEHOLDER,
};
