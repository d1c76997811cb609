//! Scores each facet against the catalog and keeps the best fitting interfaces.
//!
//! Recall is the share of a facet's selectors an interface declares. Precision
//! is the share of an interface's selectors the facet serves. The match set is
//! every interface tied on the highest recall, narrowed to those tied on the
//! highest precision among them.

use std::collections::HashSet;

use alloy::primitives::{Address, Selector};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::catalog::{Catalog, Interface};
use crate::replay::FacetState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodRef {
    pub contract: String,
    pub selector: Selector,
    pub function: String,
}

impl MethodRef {
    fn new(interface: &Interface, selector: Selector, function: &str) -> Self {
        Self {
            contract: interface.name().to_string(),
            selector,
            function: function.to_string(),
        }
    }
}

/// What one facet most likely is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetMatch {
    /// Best matching interface names, in catalog order.
    pub matches: Vec<String>,
    /// Methods of matched interfaces that the facet does not serve.
    pub misses: Vec<MethodRef>,
    /// Facet selectors declared by a matched interface.
    pub selectors: Vec<MethodRef>,
}

impl FacetMatch {
    pub fn misses_for<'a>(&'a self, contract: &'a str) -> impl Iterator<Item = &'a MethodRef> {
        self.misses.iter().filter(move |m| m.contract == contract)
    }

    pub fn selectors_for<'a>(&'a self, contract: &'a str) -> impl Iterator<Item = &'a MethodRef> {
        self.selectors.iter().filter(move |m| m.contract == contract)
    }
}

/// Per-facet results, serialized as an object keyed by checksummed address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    facets: IndexMap<Address, FacetMatch>,
}

impl MatchReport {
    pub fn get(&self, facet: &Address) -> Option<&FacetMatch> {
        self.facets.get(facet)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &FacetMatch)> {
        self.facets.iter()
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }
}

impl Serialize for MatchReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.facets.len()))?;
        for (facet, result) in &self.facets {
            map.serialize_entry(&facet.to_checksum(None), result)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Score {
    recall: f64,
    precision: f64,
}

fn score(facet: &[Selector], mounted: &HashSet<Selector>, interface: &Interface) -> Score {
    let declared = facet.iter().filter(|s| interface.contains(s)).count();
    let recall = declared as f64 / facet.len() as f64;

    let precision = if interface.is_empty() {
        0.0
    } else {
        let served = interface.methods().filter(|(s, _)| mounted.contains(*s)).count();
        served as f64 / interface.len() as f64
    };

    Score { recall, precision }
}

/// Matches one facet's selectors against every interface in the catalog.
///
/// When no interface declares any of the selectors, every interface ties at
/// zero recall and zero precision, so all of them match with every method
/// reported as a miss. Only an empty catalog yields no matches.
pub fn match_facet(selectors: &[Selector], catalog: &Catalog) -> FacetMatch {
    if selectors.is_empty() {
        return FacetMatch::default();
    }
    let mounted: HashSet<Selector> = selectors.iter().copied().collect();
    let scored: Vec<(&Interface, Score)> = catalog
        .iter()
        .map(|interface| (interface, score(selectors, &mounted, interface)))
        .collect();

    let max_recall = scored.iter().map(|(_, s)| s.recall).fold(0.0, f64::max);
    let candidates: Vec<&(&Interface, Score)> =
        scored.iter().filter(|(_, s)| s.recall == max_recall).collect();
    let max_precision = candidates
        .iter()
        .map(|(_, s)| s.precision)
        .fold(0.0, f64::max);
    let matched: Vec<&Interface> = candidates
        .into_iter()
        .filter(|(_, s)| s.precision == max_precision)
        .map(|(interface, _)| *interface)
        .collect();

    let mounted = &mounted;
    let misses = matched
        .iter()
        .flat_map(|&interface| {
            interface
                .methods()
                .filter(move |(s, _)| !mounted.contains(*s))
                .map(move |(s, f)| MethodRef::new(interface, *s, f))
        })
        .collect();
    let present = matched
        .iter()
        .flat_map(|&interface| {
            selectors.iter().filter_map(move |s| {
                interface
                    .function(s)
                    .map(|f| MethodRef::new(interface, *s, f))
            })
        })
        .collect();

    FacetMatch {
        matches: matched.iter().map(|i| i.name().to_string()).collect(),
        misses,
        selectors: present,
    }
}

/// Matches every non-empty facet in `facets` against `catalog`.
pub fn inspect(facets: &FacetState, catalog: &Catalog) -> MatchReport {
    let facets = facets
        .iter()
        .filter(|(_, selectors)| !selectors.is_empty())
        .map(|(address, selectors)| {
            let result = match_facet(selectors, catalog);
            debug!(facet = %address, matches = ?result.matches, "matched facet");
            (*address, result)
        })
        .collect();
    MatchReport { facets }
}
