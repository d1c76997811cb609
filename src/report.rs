//! Output formats for match reports.

use std::io::{self, Write};

use clap::ValueEnum;

use crate::matcher::MatchReport;
use crate::timeline::TimelineEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Human,
}

pub fn write_json<W: Write, T: serde::Serialize>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)
}

pub fn write_human<W: Write>(out: &mut W, report: &MatchReport) -> io::Result<()> {
    for (address, result) in report.iter() {
        writeln!(out, "- - -")?;
        writeln!(out, "Facet at address: {}", address.to_checksum(None))?;
        writeln!(out, "Possible contracts: {}", result.matches.join(", "))?;
        for contract in &result.matches {
            writeln!(out, "{contract}:")?;
            writeln!(out, "\tMissing methods:")?;
            for item in result.misses_for(contract) {
                writeln!(
                    out,
                    "\t\tMissing selector: {}, Function: {}",
                    item.selector, item.function
                )?;
            }
            writeln!(out, "\tMounted selectors:")?;
            for item in result.selectors_for(contract) {
                writeln!(out, "\t\tSelector: {}, Function: {}", item.selector, item.function)?;
            }
        }
    }
    Ok(())
}

pub fn write_timeline_human<W: Write>(out: &mut W, timeline: &[TimelineEntry]) -> io::Result<()> {
    for entry in timeline {
        let record = &entry.record;
        writeln!(out, "═══════════════════════════════════════════════════════════════")?;
        writeln!(
            out,
            "Block {} | tx {}",
            record.block_number, record.transaction_hash
        )?;
        for cut in record.cuts() {
            let selectors: Vec<String> = cut.selectors.iter().map(ToString::to_string).collect();
            writeln!(
                out,
                "\t{} {} [{}]",
                cut.action,
                cut.facet.to_checksum(None),
                selectors.join(", ")
            )?;
        }
        write_human(out, &entry.report)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Interface};
    use crate::matcher::inspect;
    use crate::replay::FacetState;
    use alloy::primitives::{Address, Selector};

    #[test]
    fn human_output_lists_misses_and_mounted_selectors() {
        let sel = |n: u32| Selector::from(n.to_be_bytes());
        let mut foo = Interface::new("Foo");
        foo.insert(sel(0x111), "f");
        foo.insert(sel(0x333), "h");
        let catalog: Catalog = [foo].into_iter().collect();
        let mut facets = FacetState::new();
        facets.insert(Address::with_last_byte(0xa), vec![sel(0x111)]);

        let mut out = Vec::new();
        write_human(&mut out, &inspect(&facets, &catalog)).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Possible contracts: Foo\n"), "{text}");
        assert!(text.contains("\t\tMissing selector: 0x00000333, Function: h\n"), "{text}");
        assert!(text.contains("\t\tSelector: 0x00000111, Function: f\n"), "{text}");
    }
}
