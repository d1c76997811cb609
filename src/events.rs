//! DiamondCut change records and the moonworm JSONL crawl format they come in.
//!
//! A crawl file holds one decoded event per line:
//!
//! ```json
//! {"event": "DiamondCut", "blockNumber": 27331689, "transactionHash": "0x..", "logIndex": 3,
//!  "args": {"_diamondCut": [["0xFacet", 0, ["0x1f931c1c"]]], "_init": "0x..", "_calldata": "0x"}}
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use alloy::primitives::{Address, Bytes, Selector};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{InvalidActionCode, LoadError};

pub const DIAMOND_CUT_EVENT: &str = "DiamondCut";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u8")]
pub enum FacetCutAction {
    Add = 0,
    Replace = 1,
    Remove = 2,
}

impl TryFrom<u8> for FacetCutAction {
    type Error = InvalidActionCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Add),
            1 => Ok(Self::Replace),
            2 => Ok(Self::Remove),
            other => Err(InvalidActionCode(other)),
        }
    }
}

impl fmt::Display for FacetCutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "ADD",
            Self::Replace => "REPLACE",
            Self::Remove => "REMOVE",
        })
    }
}

/// One `(facet, action, selectors)` entry of a diamond cut.
///
/// For REMOVE the facet is usually the zero address and is not consulted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(Address, FacetCutAction, Vec<Selector>)")]
pub struct FacetCut {
    pub facet: Address,
    pub action: FacetCutAction,
    pub selectors: Vec<Selector>,
}

impl FacetCut {
    pub fn new(facet: Address, action: FacetCutAction, selectors: Vec<Selector>) -> Self {
        Self {
            facet,
            action,
            selectors,
        }
    }
}

impl From<(Address, FacetCutAction, Vec<Selector>)> for FacetCut {
    fn from((facet, action, selectors): (Address, FacetCutAction, Vec<Selector>)) -> Self {
        Self::new(facet, action, selectors)
    }
}

// Written back out in the same tuple shape it was read in, with a checksummed
// facet address and the numeric action code.
impl Serialize for FacetCut {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.facet.to_checksum(None))?;
        tuple.serialize_element(&(self.action as u8))?;
        tuple.serialize_element(&self.selectors)?;
        tuple.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiamondCutArgs {
    #[serde(rename = "_diamondCut")]
    pub diamond_cut: Vec<FacetCut>,
    #[serde(rename = "_init", default, serialize_with = "checksummed")]
    pub init: Address,
    #[serde(rename = "_calldata", default)]
    pub calldata: Bytes,
}

/// A DiamondCut event with its position on chain. `init` and `calldata` ride
/// along for reporting only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub block_number: u64,
    pub transaction_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
    pub args: DiamondCutArgs,
}

impl ChangeRecord {
    pub fn new(block_number: u64, transaction_hash: impl Into<String>, cuts: Vec<FacetCut>) -> Self {
        Self {
            block_number,
            transaction_hash: transaction_hash.into(),
            log_index: None,
            args: DiamondCutArgs {
                diamond_cut: cuts,
                init: Address::ZERO,
                calldata: Bytes::new(),
            },
        }
    }

    pub fn cuts(&self) -> &[FacetCut] {
        &self.args.diamond_cut
    }
}

fn checksummed<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&address.to_checksum(None))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Crawl data
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CrawlEvent {
    #[serde(alias = "name")]
    event: String,
    block_number: u64,
    transaction_hash: String,
    #[serde(default)]
    log_index: Option<u64>,
    #[serde(default)]
    args: Value,
}

/// Parses one crawl line. Events other than DiamondCut come back as `None`.
pub fn parse_crawl_line(line: &str) -> Result<Option<ChangeRecord>, serde_json::Error> {
    let raw: CrawlEvent = serde_json::from_str(line)?;
    if raw.event != DIAMOND_CUT_EVENT {
        return Ok(None);
    }
    let args = DiamondCutArgs::deserialize(raw.args)?;
    Ok(Some(ChangeRecord {
        block_number: raw.block_number,
        transaction_hash: raw.transaction_hash,
        log_index: raw.log_index,
        args,
    }))
}

/// Reads DiamondCut records from a JSONL crawl file, ordered by
/// `(blockNumber, logIndex)`. Records without a log index sort after the
/// indexed ones of their block and keep file order among themselves.
pub fn load_crawldata(path: &Path) -> Result<Vec<ChangeRecord>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(path).map_err(io_err)?);

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed = parse_crawl_line(&line).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        match parsed {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    records.sort_by_key(|r| (r.block_number, r.log_index.unwrap_or(u64::MAX)));
    debug!(skipped, "ignored non-DiamondCut events");
    info!(
        "📜 Loaded {} DiamondCut records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}
