//! Rebuilds which selectors each facet serves by replaying DiamondCut records.

use std::collections::HashMap;

use alloy::primitives::{Address, Selector};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::ReplayError;
use crate::events::{ChangeRecord, FacetCut, FacetCutAction};

/// Facet address to its mounted selectors, in facet first-seen order.
pub type FacetState = IndexMap<Address, Vec<Selector>>;

/// Incremental DiamondCut state machine.
///
/// Every mounted selector has exactly one owner in `owners`, and appears
/// exactly once in that owner's list in `facets`. After a [`ReplayError`] the
/// replayer is inconsistent and must be dropped.
#[derive(Debug, Clone, Default)]
pub struct Replayer {
    facets: FacetState,
    owners: HashMap<Selector, Address>,
}

impl Replayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, record: &ChangeRecord) -> Result<(), ReplayError> {
        debug!(
            block = record.block_number,
            tx = %record.transaction_hash,
            cuts = record.cuts().len(),
            "applying diamond cut"
        );
        for cut in record.cuts() {
            self.apply_cut(cut, record)?;
        }
        Ok(())
    }

    fn apply_cut(&mut self, cut: &FacetCut, record: &ChangeRecord) -> Result<(), ReplayError> {
        match cut.action {
            FacetCutAction::Add => {
                self.facets.entry(cut.facet).or_default();
                for &selector in &cut.selectors {
                    match self.owners.insert(selector, cut.facet) {
                        Some(previous) if previous == cut.facet => continue,
                        Some(previous) => {
                            warn!(
                                %selector,
                                from = %previous,
                                to = %cut.facet,
                                block = record.block_number,
                                "ADD of an already mounted selector, moving it"
                            );
                            self.unmount(previous, selector);
                        }
                        None => {}
                    }
                    self.mount(cut.facet, selector);
                }
            }
            FacetCutAction::Replace => {
                self.facets.entry(cut.facet).or_default();
                for &selector in &cut.selectors {
                    let previous = self.owner_or_fail(selector, cut.action, record)?;
                    self.unmount(previous, selector);
                    self.mount(cut.facet, selector);
                    self.owners.insert(selector, cut.facet);
                }
            }
            FacetCutAction::Remove => {
                // The cut's facet address is ignored; the owner index is authoritative.
                for &selector in &cut.selectors {
                    let owner = self.owner_or_fail(selector, cut.action, record)?;
                    self.unmount(owner, selector);
                    self.owners.remove(&selector);
                }
            }
        }
        Ok(())
    }

    fn owner_or_fail(
        &self,
        selector: Selector,
        action: FacetCutAction,
        record: &ChangeRecord,
    ) -> Result<Address, ReplayError> {
        self.owners
            .get(&selector)
            .copied()
            .ok_or_else(|| ReplayError::UnknownSelector {
                action,
                selector,
                block_number: record.block_number,
                transaction_hash: record.transaction_hash.clone(),
            })
    }

    fn mount(&mut self, facet: Address, selector: Selector) {
        self.facets.entry(facet).or_default().push(selector);
    }

    fn unmount(&mut self, facet: Address, selector: Selector) {
        if let Some(selectors) = self.facets.get_mut(&facet) {
            if let Some(pos) = selectors.iter().position(|s| *s == selector) {
                selectors.remove(pos);
            }
        }
    }

    pub fn owner_of(&self, selector: &Selector) -> Option<Address> {
        self.owners.get(selector).copied()
    }

    /// Number of selectors currently mounted across all facets.
    pub fn mounted(&self) -> usize {
        self.owners.len()
    }

    /// Current mapping with emptied facets left out.
    pub fn snapshot(&self) -> FacetState {
        self.facets
            .iter()
            .filter(|(_, selectors)| !selectors.is_empty())
            .map(|(facet, selectors)| (*facet, selectors.clone()))
            .collect()
    }

    pub fn into_state(self) -> FacetState {
        self.facets
            .into_iter()
            .filter(|(_, selectors)| !selectors.is_empty())
            .collect()
    }
}

/// Replays `records` in the given order from an empty diamond.
pub fn replay<'a, I>(records: I) -> Result<FacetState, ReplayError>
where
    I: IntoIterator<Item = &'a ChangeRecord>,
{
    let mut replayer = Replayer::new();
    for record in records {
        replayer.apply(record)?;
    }
    Ok(replayer.into_state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(byte: u8) -> Address {
        Address::with_last_byte(byte)
    }

    fn sel(n: u32) -> Selector {
        Selector::from(n.to_be_bytes())
    }

    fn cut(facet: Address, action: FacetCutAction, selectors: &[u32]) -> FacetCut {
        FacetCut::new(facet, action, selectors.iter().copied().map(sel).collect())
    }

    fn record(block: u64, cuts: Vec<FacetCut>) -> ChangeRecord {
        ChangeRecord::new(block, format!("0x{block:064x}"), cuts)
    }

    fn state(entries: &[(Address, &[u32])]) -> FacetState {
        entries
            .iter()
            .map(|(a, s)| (*a, s.iter().copied().map(sel).collect()))
            .collect()
    }

    #[test]
    fn add_mounts_selectors_in_order() {
        let records = [record(1, vec![cut(addr(0xa), FacetCutAction::Add, &[0x111, 0x222])])];
        assert_eq!(replay(&records).unwrap(), state(&[(addr(0xa), &[0x111, 0x222])]));
    }

    #[test]
    fn replace_moves_selectors_to_the_new_facet() {
        let records = [
            record(1, vec![cut(addr(0xa), FacetCutAction::Add, &[1, 2, 3])]),
            record(2, vec![cut(addr(0xb), FacetCutAction::Replace, &[2])]),
        ];
        assert_eq!(
            replay(&records).unwrap(),
            state(&[(addr(0xa), &[1, 3]), (addr(0xb), &[2])])
        );
    }

    #[test]
    fn remove_with_zero_address_resolves_the_real_owner() {
        let records = [
            record(1, vec![
                cut(addr(0xa), FacetCutAction::Add, &[1, 2]),
                cut(addr(0xb), FacetCutAction::Add, &[3]),
            ]),
            record(2, vec![cut(Address::ZERO, FacetCutAction::Remove, &[2, 3])]),
        ];
        assert_eq!(replay(&records).unwrap(), state(&[(addr(0xa), &[1])]));
    }

    #[test]
    fn emptied_facets_are_pruned() {
        let records = [
            record(1, vec![cut(addr(0xa), FacetCutAction::Add, &[1, 2])]),
            record(2, vec![cut(addr(0xb), FacetCutAction::Add, &[3])]),
            record(3, vec![cut(Address::ZERO, FacetCutAction::Remove, &[1, 2])]),
        ];
        let out = replay(&records).unwrap();
        assert!(!out.contains_key(&addr(0xa)));
        assert_eq!(out, state(&[(addr(0xb), &[3])]));
    }

    #[test]
    fn replace_of_unknown_selector_fails() {
        let records = [record(7, vec![cut(addr(0xa), FacetCutAction::Replace, &[9])])];
        match replay(&records) {
            Err(ReplayError::UnknownSelector {
                action,
                selector,
                block_number,
                ..
            }) => {
                assert_eq!(action, FacetCutAction::Replace);
                assert_eq!(selector, sel(9));
                assert_eq!(block_number, 7);
            }
            other => panic!("expected UnknownSelector, got {other:?}"),
        }
    }

    #[test]
    fn remove_of_unknown_selector_fails() {
        let records = [
            record(1, vec![cut(addr(0xa), FacetCutAction::Add, &[1])]),
            record(2, vec![cut(Address::ZERO, FacetCutAction::Remove, &[1])]),
            record(3, vec![cut(Address::ZERO, FacetCutAction::Remove, &[1])]),
        ];
        assert!(matches!(
            replay(&records),
            Err(ReplayError::UnknownSelector { block_number: 3, .. })
        ));
    }

    #[test]
    fn re_adding_a_mounted_selector_keeps_a_single_owner() {
        let records = [
            record(1, vec![cut(addr(0xa), FacetCutAction::Add, &[1, 2])]),
            record(2, vec![cut(addr(0xa), FacetCutAction::Add, &[2])]),
            record(3, vec![cut(addr(0xb), FacetCutAction::Add, &[1])]),
        ];
        assert_eq!(
            replay(&records).unwrap(),
            state(&[(addr(0xa), &[2]), (addr(0xb), &[1])])
        );
    }

    #[test]
    fn replaying_twice_gives_the_same_state() {
        let records = [
            record(1, vec![cut(addr(0xa), FacetCutAction::Add, &[1, 2, 3, 4])]),
            record(2, vec![cut(addr(0xb), FacetCutAction::Replace, &[3, 4])]),
            record(3, vec![cut(Address::ZERO, FacetCutAction::Remove, &[1])]),
        ];
        assert_eq!(replay(&records).unwrap(), replay(&records).unwrap());
    }

    #[test]
    fn mounted_count_is_conserved_and_owners_agree() {
        let records = [
            record(1, vec![cut(addr(0xa), FacetCutAction::Add, &[1, 2, 3, 4])]),
            record(2, vec![
                cut(addr(0xb), FacetCutAction::Add, &[5, 6]),
                cut(addr(0xb), FacetCutAction::Replace, &[1, 2]),
            ]),
            record(3, vec![cut(Address::ZERO, FacetCutAction::Remove, &[3, 5])]),
            record(4, vec![cut(addr(0xc), FacetCutAction::Replace, &[6])]),
        ];
        let mut replayer = Replayer::new();
        let (mut adds, mut removes) = (0usize, 0usize);
        for record in &records {
            replayer.apply(record).unwrap();
            for cut in record.cuts() {
                match cut.action {
                    FacetCutAction::Add => adds += cut.selectors.len(),
                    FacetCutAction::Remove => removes += cut.selectors.len(),
                    FacetCutAction::Replace => {}
                }
            }
            let snapshot = replayer.snapshot();
            let total: usize = snapshot.values().map(Vec::len).sum();
            assert_eq!(total, adds - removes);
            assert_eq!(total, replayer.mounted());
            for (facet, selectors) in &snapshot {
                for selector in selectors {
                    assert_eq!(replayer.owner_of(selector), Some(*facet));
                }
            }
        }
        assert_eq!(
            replayer.snapshot(),
            state(&[(addr(0xa), &[4]), (addr(0xb), &[1, 2]), (addr(0xc), &[6])])
        );
    }
}
