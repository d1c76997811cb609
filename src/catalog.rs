//! Candidate interfaces a facet may implement, built from ABI JSON.

use std::fs;
use std::path::{Path, PathBuf};

use alloy::primitives::Selector;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::selector::MethodDescriptor;

/// A named set of methods keyed by selector.
///
/// Colliding selectors keep the most recently inserted method name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interface {
    name: String,
    methods: IndexMap<Selector, String>,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: IndexMap::new(),
        }
    }

    pub fn from_methods<I>(name: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = MethodDescriptor>,
    {
        let mut interface = Self::new(name);
        for method in methods {
            interface.insert(method.selector(), method.name);
        }
        interface
    }

    /// Builds an interface from raw ABI entries, skipping anything that is not
    /// a well formed function.
    pub fn from_abi(name: impl Into<String>, abi: &[Value]) -> Self {
        let interface = Self::from_methods(
            name,
            abi.iter().filter_map(MethodDescriptor::from_abi_item),
        );
        debug!(
            interface = %interface.name,
            methods = interface.len(),
            abi_items = abi.len(),
            "built interface"
        );
        interface
    }

    pub fn insert(&mut self, selector: Selector, function: impl Into<String>) {
        self.methods.insert(selector, function.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function(&self, selector: &Selector) -> Option<&str> {
        self.methods.get(selector).map(String::as_str)
    }

    pub fn contains(&self, selector: &Selector) -> bool {
        self.methods.contains_key(selector)
    }

    pub fn methods(&self) -> impl Iterator<Item = (&Selector, &str)> {
        self.methods.iter().map(|(s, f)| (s, f.as_str()))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Interfaces by name, iterated in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    interfaces: IndexMap<String, Interface>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interface, replacing any earlier one with the same name.
    pub fn insert(&mut self, interface: Interface) {
        self.interfaces.insert(interface.name.clone(), interface);
    }

    pub fn get(&self, name: &str) -> Option<&Interface> {
        self.interfaces.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.values()
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Loads every `*.json` ABI or build artifact in `dir`, in file name order.
    ///
    /// A brownie project root is accepted too: its `build/contracts` directory
    /// is used when present. Files that do not look like an ABI are skipped.
    pub fn load_dir(dir: &Path) -> Result<Self, LoadError> {
        let brownie_build = dir.join("build").join("contracts");
        let dir = if brownie_build.is_dir() {
            brownie_build
        } else {
            dir.to_path_buf()
        };

        let io_err = |path: &Path, source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(|e| io_err(&dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut catalog = Self::new();
        for path in &paths {
            let raw = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
            let value: Value = match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "⚠️ Skipping unparseable JSON");
                    continue;
                }
            };
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            match abi_of(&value) {
                Some((name, abi)) => {
                    catalog.insert(Interface::from_abi(name.unwrap_or(stem), abi));
                }
                None => warn!(path = %path.display(), "⚠️ No ABI found, skipping"),
            }
        }

        info!(
            "📚 Loaded {} interfaces from {}",
            catalog.len(),
            dir.display()
        );
        Ok(catalog)
    }
}

impl FromIterator<Interface> for Catalog {
    fn from_iter<T: IntoIterator<Item = Interface>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for interface in iter {
            catalog.insert(interface);
        }
        catalog
    }
}

/// Finds the ABI array inside a JSON document: either the document itself, or
/// the `abi` field of a build artifact. Artifacts may also name the contract.
pub fn abi_of(value: &Value) -> Option<(Option<String>, &[Value])> {
    match value {
        Value::Array(items) => Some((None, items.as_slice())),
        Value::Object(fields) => {
            let abi = fields.get("abi")?.as_array()?;
            let name = fields
                .get("contractName")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some((name, abi.as_slice()))
        }
        _ => None,
    }
}
