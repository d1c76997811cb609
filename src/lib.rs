//! Inspector Facet: what methods is your EIP-2535 Diamond proxy serving?
//!
//! Replays DiamondCut events (or reads a live loupe) into a facet to selector
//! mapping, then matches each facet against a catalog of known ABIs.

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod loupe;
pub mod matcher;
pub mod replay;
pub mod report;
pub mod selector;
pub mod timeline;

pub use catalog::{Catalog, Interface};
pub use error::{LoadError, LoupeError, ReplayError, UsageError};
pub use events::{load_crawldata, ChangeRecord, FacetCut, FacetCutAction};
pub use matcher::{inspect, match_facet, FacetMatch, MatchReport, MethodRef};
pub use replay::{replay, FacetState, Replayer};
pub use timeline::{compose, TimelineEntry};
