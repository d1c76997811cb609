//! Command line options and the validated run configuration built from them.

use std::path::PathBuf;

use alloy::primitives::Address;
use clap::Parser;
use url::Url;

use crate::error::UsageError;
use crate::report::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "inspector-facet",
    version,
    about = "What methods is your EIP-2535 Diamond proxy contract serving?"
)]
pub struct Cli {
    /// JSON-RPC endpoint to query the diamond's loupe on
    #[arg(long, env = "INSPECTOR_RPC_URL")]
    pub rpc_url: Option<Url>,

    /// Address of the Diamond contract
    #[arg(long, env = "INSPECTOR_DIAMOND_ADDRESS")]
    pub address: Option<Address>,

    /// JSONL file of moonworm crawl data for the diamond
    #[arg(short, long)]
    pub crawldata: Option<PathBuf>,

    /// Directory of ABI or build artifact JSON files (or a brownie project)
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Report matches after every DiamondCut instead of only the final state
    #[arg(long)]
    pub timeline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetSource {
    Loupe { rpc_url: Url, diamond: Address },
    Crawldata(PathBuf),
}

/// Validated run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source: FacetSource,
    pub project: Option<PathBuf>,
    pub format: OutputFormat,
    pub timeline: bool,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, UsageError> {
        let source = match (cli.rpc_url, cli.crawldata) {
            (Some(_), Some(_)) => return Err(UsageError::ConflictingSources),
            (None, None) => return Err(UsageError::NoFacetSource),
            (Some(rpc_url), None) => {
                let diamond = cli.address.ok_or(UsageError::MissingDiamondAddress)?;
                FacetSource::Loupe { rpc_url, diamond }
            }
            (None, Some(path)) => FacetSource::Crawldata(path),
        };

        if cli.timeline && !matches!(source, FacetSource::Crawldata(_)) {
            return Err(UsageError::TimelineWithoutCrawldata);
        }

        Ok(Self {
            source,
            project: cli.project,
            format: cli.format,
            timeline: cli.timeline,
        })
    }
}
