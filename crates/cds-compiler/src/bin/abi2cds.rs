//! Compiles a contract ABI into a connector definition.
//!
//! # Usage
//!
//! ```bash
//! # Compile a local ABI JSON file
//! abi2cds --input erc20.json --name "My Token" --output my-token.json
//!
//! # Fetch a verified ABI from a block explorer (tokens from ETHERSCAN_API_TOKEN etc.)
//! abi2cds --chain eip155:1 --address 0xdAC17F958D2ee523a2206206994597C13D831ec7 --name Tether
//! ```
//!
//! Enrichment is not available from the command line.

use cds_compiler::{
    api::AbiExplorerClient,
    config::ExplorerConfig,
    external::{InMemoryKeyRegistry, InlineOnlyIconResolver},
    ConnectorService, ConvertRequest,
};
use clap::Parser;
use serde_json::Value;
use std::{fs, path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

/// Compile a smart-contract ABI into a Connector Definition Schema document.
#[derive(Parser, Debug)]
#[command(name = "abi2cds")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a local ABI JSON file
    #[arg(short, long, conflicts_with_all = ["chain", "address"])]
    input: Option<PathBuf>,

    /// CAIP-2 chain id to fetch the ABI from (e.g. eip155:1)
    #[arg(short, long, requires = "address")]
    chain: Option<String>,

    /// Contract address to fetch the ABI of
    #[arg(short, long, requires = "chain")]
    address: Option<String>,

    /// Connector name; the connector key is derived from it
    #[arg(short, long)]
    name: Option<String>,

    /// Connector icon as a data: URI
    #[arg(long)]
    icon: Option<String>,

    /// Connector description
    #[arg(short, long)]
    description: Option<String>,

    /// Output file; prints to stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Explorer request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let abi = if let Some(input_path) = &args.input {
        info!(path = %input_path.display(), "loading ABI");
        Value::String(fs::read_to_string(input_path)?)
    } else if let (Some(chain), Some(address)) = (&args.chain, &args.address) {
        let config = ExplorerConfig::from_env().with_timeout(Duration::from_secs(args.timeout));
        let client = AbiExplorerClient::new(config)?;
        Value::String(client.fetch_abi(chain, address).await?)
    } else {
        anyhow::bail!("Either --input or --chain and --address must be specified");
    };

    let mut request = ConvertRequest::new(abi);
    request.name = args.name;
    request.icon = args.icon;
    request.description = args.description;

    let service = ConnectorService::new(
        Arc::new(InMemoryKeyRegistry::new()),
        Arc::new(InlineOnlyIconResolver),
    );
    let document = service.convert(request).await?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };

    match &args.output {
        Some(output_path) => {
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(output_path, json)?;
            info!(path = %output_path.display(), "wrote connector");
        }
        None => println!("{json}"),
    }

    info!(
        key = %document.key,
        triggers = document.triggers.len(),
        actions = document.actions.len(),
        "done"
    );
    Ok(())
}
