//! # CDS Compiler
//!
//! Compiles smart-contract ABIs into Connector Definition Schema (CDS)
//! documents: one trigger per event, one action per function, with typed
//! fields, human-readable labels and Solidity-like signatures.
//!
//! ## Quick Start
//!
//! ```rust
//! use cds_compiler::compiler::{compile, ConnectorMeta};
//! use serde_json::json;
//!
//! let abi = json!([{
//!     "type": "function",
//!     "name": "balanceOf",
//!     "constant": true,
//!     "inputs": [{"name": "who", "type": "address"}],
//!     "outputs": [{"name": "", "type": "uint256"}]
//! }]);
//!
//! let doc = compile(&abi, &ConnectorMeta::named("My Token")).unwrap();
//! assert_eq!(doc.key, "my-token");
//! assert_eq!(doc.actions[0].display.label, "Balance of (View function)");
//! ```
//!
//! ## Enrichment
//!
//! Compilation is pure. Generated descriptions and helper texts come from an
//! optional pass driven by a [`StructuredCompletion`](enrich::StructuredCompletion)
//! the caller provides:
//!
//! ```rust,ignore
//! let service = ConnectorService::new(registry, icons).with_completion(completion);
//! let doc = service
//!     .convert(ConvertRequest::new(abi).with_name("My Token").enhanced(Some(10)))
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`abi`] - Contract ABI types and parsing
//! - [`cds`] - Connector document types and cloning
//! - [`compiler`] - ABI to connector compilation
//! - [`enrich`] - Batched enrichment through a completion capability
//! - [`service`] - Request-level orchestration
//! - [`api`] - Block-explorer client for verified ABIs

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod abi;
pub mod api;
pub mod cds;
pub mod compiler;
pub mod config;
pub mod enrich;
pub mod error;
pub mod external;
pub mod retry;
pub mod service;

pub use cds::ConnectorDocument;
pub use compiler::{compile, ConnectorMeta};
pub use error::{CdsError, CdsResult};
pub use service::{ConnectorService, ConvertRequest};
