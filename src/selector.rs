//! Function selectors: the first four bytes of the keccak256 hash of a
//! normalized signature such as `transfer(address,uint256)`.
//!
//! Two methods with the same normalized signature share a selector, and so do
//! the occasional unrelated signatures whose hashes collide in 4 bytes. Both
//! cases are kept as they are, since that is exactly what a diamond sees.

use alloy::primitives::{keccak256, Selector};
use serde::Deserialize;
use serde_json::Value;

/// Normalized `name(type1,type2,...)` form with all whitespace removed.
pub fn signature<S: AsRef<str>>(name: &str, param_types: &[S]) -> String {
    let params: Vec<String> = param_types
        .iter()
        .map(|ty| strip_whitespace(ty.as_ref()))
        .collect();
    format!("{}({})", strip_whitespace(name), params.join(","))
}

pub fn encode<S: AsRef<str>>(name: &str, param_types: &[S]) -> Selector {
    selector_of(&signature(name, param_types))
}

/// Selector of an already formatted signature. Whitespace is ignored.
pub fn selector_of(signature: &str) -> Selector {
    let hash = keccak256(strip_whitespace(signature).as_bytes());
    Selector::from_slice(&hash[..4])
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// ABI method descriptors
// ═══════════════════════════════════════════════════════════════════════════════

/// A method pulled out of an ABI: its name and ordered canonical parameter types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub inputs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AbiItem {
    #[serde(rename = "type", default = "default_item_type")]
    item_type: String,
    name: Option<String>,
    inputs: Option<Vec<AbiParam>>,
}

#[derive(Debug, Deserialize)]
struct AbiParam {
    #[serde(rename = "type")]
    ty: Option<String>,
    #[serde(default)]
    components: Option<Vec<AbiParam>>,
}

// Solidity ABI JSON treats a missing "type" as a function entry.
fn default_item_type() -> String {
    "function".to_string()
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, inputs: Vec<String>) -> Self {
        Self {
            name: name.into(),
            inputs,
        }
    }

    /// Reads one ABI JSON entry. Anything that is not a function, or lacks a
    /// name or a resolvable parameter list, yields `None`.
    pub fn from_abi_item(item: &Value) -> Option<Self> {
        let item = AbiItem::deserialize(item).ok()?;
        if item.item_type != "function" {
            return None;
        }
        let name = item.name.filter(|n| !n.is_empty())?;
        let inputs = item
            .inputs?
            .iter()
            .map(canonical_type)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { name, inputs })
    }

    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    pub fn selector(&self) -> Selector {
        encode(&self.name, &self.inputs)
    }
}

/// `tuple` parameters expand to `(t1,t2,...)`, keeping any array suffix.
fn canonical_type(param: &AbiParam) -> Option<String> {
    let ty = strip_whitespace(param.ty.as_deref()?);
    match ty.strip_prefix("tuple") {
        Some(suffix) => {
            let inner = param
                .components
                .as_ref()?
                .iter()
                .map(canonical_type)
                .collect::<Option<Vec<_>>>()?;
            Some(format!("({}){}", inner.join(","), suffix))
        }
        None => Some(ty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn sel(s: &str) -> Selector {
        Selector::from_str(s).unwrap()
    }

    #[test]
    fn well_known_selectors() {
        assert_eq!(encode("transfer", &["address", "uint256"]), sel("0xa9059cbb"));
        assert_eq!(encode::<&str>("totalSupply", &[]), sel("0x18160ddd"));
        assert_eq!(encode("supportsInterface", &["bytes4"]), sel("0x01ffc9a7"));
        assert_eq!(selector_of("balanceOf(address)"), sel("0x70a08231"));
    }

    #[test]
    fn whitespace_is_normalized_away() {
        assert_eq!(signature("approve", &[" address", "uint256 "]), "approve(address,uint256)");
        assert_eq!(selector_of("approve(address, uint256)"), sel("0x095ea7b3"));
    }

    #[test]
    fn renders_as_prefixed_lowercase_hex() {
        assert_eq!(encode("owner", &[] as &[&str]).to_string(), "0x8da5cb5b");
    }

    #[test]
    fn tuple_parameters_expand_to_their_components() {
        let item = json!({
            "type": "function",
            "name": "diamondCut",
            "inputs": [
                {
                    "type": "tuple[]",
                    "components": [
                        {"name": "facetAddress", "type": "address"},
                        {"name": "action", "type": "uint8"},
                        {"name": "functionSelectors", "type": "bytes4[]"}
                    ]
                },
                {"name": "_init", "type": "address"},
                {"name": "_calldata", "type": "bytes"}
            ]
        });
        let method = MethodDescriptor::from_abi_item(&item).unwrap();
        assert_eq!(
            method.signature(),
            "diamondCut((address,uint8,bytes4[])[],address,bytes)"
        );
        assert_eq!(method.selector(), sel("0x1f931c1c"));
    }

    #[test]
    fn non_functions_and_unnamed_items_are_skipped() {
        let event = json!({"type": "event", "name": "Transfer", "inputs": []});
        let fallback = json!({"type": "fallback", "stateMutability": "payable"});
        let no_inputs = json!({"type": "function", "name": "broken"});
        let no_name = json!({"type": "function", "inputs": []});
        let bad_tuple = json!({"type": "function", "name": "f", "inputs": [{"type": "tuple"}]});
        for item in [event, fallback, no_inputs, no_name, bad_tuple] {
            assert_eq!(MethodDescriptor::from_abi_item(&item), None, "{item}");
        }
    }

    #[test]
    fn missing_type_defaults_to_function() {
        let item = json!({"name": "facets", "inputs": []});
        let method = MethodDescriptor::from_abi_item(&item).unwrap();
        assert_eq!(method.selector(), sel("0x7a0ed627"));
    }
}
