//! The page/component manifest and the engine-owned part of it.

pub mod component_id;
pub mod file;
pub mod merge;

pub use component_id::{is_component_name, ComponentId};
pub use file::ManifestFile;
pub use merge::{merge, merge_manifest, DiscoveredLibrary, MergeReport};

use crate::config::LibraryPattern;
use crate::core::path::namespace_value_prefix;
use serde_json::{Map, Value};

/// An ordered `usingComponents` mapping: usage key -> usage value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsingComponents {
    entries: Map<String, Value>,
}

/// A manifest entry this engine is allowed to rewrite or delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedEntry {
    pub id: ComponentId,
    pub key: String,
    pub value: String,
}

impl UsingComponents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Usage value for a key, when it is a string
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or overwrite an entry; a new key goes to the end
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), Value::String(value.into()));
    }

    /// Remove an entry, keeping the order of the others
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.shift_remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Entries owned by this engine
    ///
    /// An entry is owned when its key splits into a configured prefix plus a
    /// component name AND its value points into the staged namespace
    /// (`/<namespace>/...`). First-party components that merely share a
    /// prefix are therefore never treated as library components.
    pub fn owned(&self, patterns: &[LibraryPattern], namespace: &str) -> Vec<OwnedEntry> {
        let value_prefix = namespace_value_prefix(namespace);
        self.entries
            .iter()
            .filter_map(|(key, value)| {
                let value = value.as_str()?;
                if !value.starts_with(&value_prefix) {
                    return None;
                }
                let id = ComponentId::parse(key, patterns)?;
                Some(OwnedEntry {
                    id,
                    key: key.clone(),
                    value: value.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UsingComponents {
        let mut usings = UsingComponents::new();
        usings.insert("my-card", "/components/card/index");
        usings.insert("van-button", "/wxcomponents/@vant/weapp/button/index");
        usings.insert("van-local", "/components/van-local/index");
        usings.insert("lx-a", "/wxcomponents/lx-ui/a/index");
        usings
    }

    #[test]
    fn test_owned_requires_prefix_and_namespace() {
        let patterns = vec![
            LibraryPattern::new("@vant/weapp", "van"),
            LibraryPattern::new("lx-ui", "lx"),
        ];
        let owned = sample().owned(&patterns, "wxcomponents");
        let keys: Vec<_> = owned.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["van-button", "lx-a"]);
        assert_eq!(owned[0].id, ComponentId::new("van", "button"));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut usings = sample();
        assert!(usings.remove("van-button"));
        assert!(!usings.remove("van-button"));
        let keys: Vec<_> = usings.keys().cloned().collect();
        assert_eq!(keys, vec!["my-card", "van-local", "lx-a"]);
    }
}
