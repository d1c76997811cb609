//! Match reports after every DiamondCut, for diffing a diamond's history.

use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

use crate::catalog::Catalog;
use crate::error::ReplayError;
use crate::events::ChangeRecord;
use crate::matcher::{inspect, MatchReport};
use crate::replay::Replayer;

/// The report right after `record` was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub report: MatchReport,
    pub record: ChangeRecord,
}

// Serialized as a `[report, record]` pair.
impl Serialize for TimelineEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.report)?;
        pair.serialize_element(&self.record)?;
        pair.end()
    }
}

/// Applies records one at a time and matches each intermediate state.
///
/// Equivalent to replaying every prefix from scratch, but the replayer is
/// advanced incrementally and only the matcher runs per step.
pub fn compose(records: &[ChangeRecord], catalog: &Catalog) -> Result<Vec<TimelineEntry>, ReplayError> {
    let mut replayer = Replayer::new();
    records
        .iter()
        .map(|record| {
            replayer.apply(record)?;
            Ok(TimelineEntry {
                report: inspect(&replayer.snapshot(), catalog),
                record: record.clone(),
            })
        })
        .collect()
}
