use std::path::PathBuf;

use alloy::primitives::{Address, Selector};

use crate::events::FacetCutAction;

/// A change record asked to move or drop a selector that nothing owns.
///
/// The log is either malformed or out of order. The replayer state is no
/// longer trustworthy once this is raised, so callers abort the run.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error(
        "{action} of selector {selector} which is not mounted on any facet \
         (block {block_number}, tx {transaction_hash})"
    )]
    UnknownSelector {
        action: FacetCutAction,
        selector: Selector,
        block_number: u64,
        transaction_hash: String,
    },
}

/// Cut action code outside of 0 (add), 1 (replace), 2 (remove).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown diamond cut action {0}, expected 0 (add), 1 (replace) or 2 (remove)")]
pub struct InvalidActionCode(pub u8);

/// Failures reading crawl data or ABI catalogs from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}: invalid event: {source}", .path.display())]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Rejected command line input, raised before any work starts.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("no facet source given: pass either --rpc-url or --crawldata")]
    NoFacetSource,
    #[error("--rpc-url and --crawldata are mutually exclusive")]
    ConflictingSources,
    #[error("an address for the Diamond contract is required to query facets over RPC")]
    MissingDiamondAddress,
    #[error("timeline mode replays a change log and requires --crawldata")]
    TimelineWithoutCrawldata,
}

#[derive(Debug, thiserror::Error)]
pub enum LoupeError {
    #[error("facets() call on diamond {diamond} failed: {source}")]
    Call {
        diamond: Address,
        #[source]
        source: alloy::contract::Error,
    },
}
