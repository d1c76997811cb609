use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use inspector_facet::catalog::abi_of;
use inspector_facet::selector::{selector_of, MethodDescriptor};

/// Prints function selectors for signatures or for every function in an ABI file.
#[derive(Debug, Parser)]
#[command(name = "selector_calc", version)]
struct Args {
    /// Signatures such as "transfer(address,uint256)"
    signatures: Vec<String>,

    /// ABI JSON or build artifact to list selectors for
    #[arg(long)]
    abi: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    for sig in &args.signatures {
        println!("{} -> {}", selector_of(sig), sig);
    }

    if let Some(path) = &args.abi {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        let (_, items) = abi_of(&value)
            .with_context(|| format!("No ABI found in {}", path.display()))?;
        for method in items.iter().filter_map(MethodDescriptor::from_abi_item) {
            println!("{} -> {}", method.selector(), method.signature());
        }
    }

    Ok(())
}
