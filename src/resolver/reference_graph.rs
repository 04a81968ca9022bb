use crate::config::LibraryPattern;
use crate::core::jsonc;
use crate::core::path::{join_slash, normalize_path, resolve_usage_value, staged_library_dir};
use crate::manifest::{is_component_name, ComponentId, UsingComponents};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tokio::task::JoinSet;

/// Every library component reachable from compiled markup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    ids: BTreeSet<ComponentId>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &ComponentId) -> bool {
        self.ids.contains(id)
    }

    /// Returns true when the id was not present before
    pub fn insert(&mut self, id: ComponentId) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentId> {
        self.ids.iter()
    }

    /// Flattened keys, sorted
    pub fn keys(&self) -> Vec<String> {
        self.ids.iter().map(ComponentId::key).collect()
    }
}

impl FromIterator<ComponentId> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// A component descriptor (`index.json`): only its sub-component usages matter here
#[derive(Debug, Default, Deserialize)]
struct ComponentDescriptor {
    #[serde(rename = "usingComponents", default)]
    using_components: Option<Map<String, Value>>,
}

/// Where a descriptor's usage value points
#[derive(Debug, PartialEq, Eq)]
enum UsageTarget {
    /// Inside a configured library's staged directory
    Staged(ComponentId),
    /// First-party component, plugin, or anything outside the staged libraries
    External,
    /// No usable path; only the local name is known
    Unknown,
}

/// Computes the transitive closure of component usage
///
/// Nodes are component ids; an edge A -> B exists when A's descriptor declares
/// a usage that resolves to B. Traversal is breadth-first with a visited set,
/// so each id is expanded at most once and cycles terminate.
pub struct ReferenceResolver {
    output_dir: PathBuf,
    namespace: String,
    patterns: Vec<LibraryPattern>,
    descriptor_ext: String,
}

impl ReferenceResolver {
    pub fn new(
        output_dir: &Path,
        namespace: &str,
        patterns: &[LibraryPattern],
        descriptor_ext: &str,
    ) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            namespace: namespace.to_string(),
            patterns: patterns.to_vec(),
            descriptor_ext: descriptor_ext.to_string(),
        }
    }

    /// Expand `seeds` through component descriptors until nothing new appears
    ///
    /// Only ids with a manifest entry are expanded. Descriptors within one
    /// breadth-first layer are read concurrently; layers run in order.
    pub async fn resolve(&self, seeds: BTreeSet<ComponentId>, usings: &UsingComponents) -> ReferenceSet {
        let mut references = ReferenceSet::new();
        let mut frontier = Vec::new();
        for id in seeds {
            if references.insert(id.clone()) {
                frontier.push(id);
            }
        }

        let mut layer = 0usize;
        while !frontier.is_empty() {
            layer += 1;
            let mut join_set = JoinSet::new();
            for id in frontier.drain(..) {
                let Some(value) = usings.get(&id.key()) else {
                    continue;
                };
                let entry = resolve_usage_value(&self.output_dir, value);
                let descriptor_path = entry.with_extension(&self.descriptor_ext);
                let component_dir = entry.parent().map(Path::to_path_buf).unwrap_or_default();
                join_set.spawn(async move {
                    let usages = read_descriptor(&descriptor_path).await;
                    (id, component_dir, usages)
                });
            }

            let mut expanded = Vec::new();
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(result) => expanded.push(result),
                    Err(e) => tracing::error!(error = %e, "descriptor read task failed"),
                }
            }
            // Join order is nondeterministic; keep the traversal stable
            expanded.sort_by(|a, b| a.0.cmp(&b.0));

            for (id, component_dir, usages) in expanded {
                let owner = self.owner_of(&component_dir, &id);
                for (key, value) in usages {
                    let Some(sub) = self.qualify(&key, &value, owner, &component_dir) else {
                        tracing::debug!(component = %id, usage = %key, "usage outside configured libraries, ignored");
                        continue;
                    };
                    if references.insert(sub.clone()) {
                        tracing::debug!(component = %id, usage = %sub, "transitive usage");
                        frontier.push(sub);
                    }
                }
            }
            tracing::debug!(layer, total = references.len(), "reference layer resolved");
        }

        references
    }

    /// Pattern whose staged directory holds `component_dir`
    ///
    /// Falls back to the id's own prefix when the path lies elsewhere.
    fn owner_of(&self, component_dir: &Path, id: &ComponentId) -> Option<&LibraryPattern> {
        self.patterns
            .iter()
            .filter(|p| component_dir.starts_with(self.library_dir(p)))
            .max_by_key(|p| p.module.len())
            .or_else(|| self.patterns.iter().find(|p| p.prefix == id.prefix))
    }

    fn library_dir(&self, pattern: &LibraryPattern) -> PathBuf {
        staged_library_dir(&self.output_dir, &self.namespace, &pattern.module)
    }

    /// Turn one declared usage into a component id
    ///
    /// 1. A key that is already `prefix-name` for a configured prefix is used as is.
    /// 2. Otherwise the usage path decides: a path into a staged library names
    ///    the component directly; a path anywhere else is not ours.
    /// 3. With no usable path, the local name is qualified with the owner's prefix.
    fn qualify(
        &self,
        key: &str,
        value: &Value,
        owner: Option<&LibraryPattern>,
        component_dir: &Path,
    ) -> Option<ComponentId> {
        if let Some(id) = ComponentId::parse(key, &self.patterns) {
            return Some(id);
        }

        match self.target_of(value, component_dir) {
            UsageTarget::Staged(id) => Some(id),
            UsageTarget::External => None,
            UsageTarget::Unknown => {
                let owner = owner?;
                is_component_name(key).then(|| ComponentId::new(&owner.prefix, key))
            }
        }
    }

    fn target_of(&self, value: &Value, component_dir: &Path) -> UsageTarget {
        let Some(value) = value.as_str().map(str::trim).filter(|v| !v.is_empty()) else {
            return UsageTarget::Unknown;
        };
        if value.contains("://") {
            return UsageTarget::External;
        }

        let target = if value.starts_with('/') {
            resolve_usage_value(&self.output_dir, value)
        } else {
            normalize_path(&join_slash(component_dir, value))
        };

        for pattern in &self.patterns {
            let Ok(rest) = target.strip_prefix(self.library_dir(pattern)) else {
                continue;
            };
            if let Some(Component::Normal(name)) = rest.components().next() {
                if let Some(name) = name.to_str().filter(|n| is_component_name(n)) {
                    return UsageTarget::Staged(ComponentId::new(&pattern.prefix, name));
                }
            }
        }
        UsageTarget::External
    }
}

/// Declared usages of a component; unreadable descriptors declare none
async fn read_descriptor(path: &Path) -> Vec<(String, Value)> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(descriptor = %path.display(), error = %e, "could not read component descriptor");
            return Vec::new();
        }
    };

    match jsonc::parse::<ComponentDescriptor>(&content) {
        Ok(descriptor) => descriptor
            .using_components
            .map(|map| map.into_iter().collect())
            .unwrap_or_default(),
        Err(e) => {
            tracing::warn!(descriptor = %path.display(), error = %e, "could not parse component descriptor");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        output: PathBuf,
        usings: UsingComponents,
        patterns: Vec<LibraryPattern>,
    }

    impl Fixture {
        fn new(patterns: Vec<LibraryPattern>) -> Self {
            let temp = TempDir::new().unwrap();
            let output = temp.path().join("dist");
            fs::create_dir_all(&output).unwrap();
            Self {
                _temp: temp,
                output,
                usings: UsingComponents::new(),
                patterns,
            }
        }

        /// Stage a component and register it in the manifest
        fn component(&mut self, module: &str, prefix: &str, name: &str, descriptor: &str) {
            let dir = self.output.join("wxcomponents").join(module).join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("index.json"), descriptor).unwrap();
            self.usings.insert(
                format!("{}-{}", prefix, name),
                format!("/wxcomponents/{}/{}/index", module, name),
            );
        }

        async fn resolve(&self, seeds: &[(&str, &str)]) -> Vec<String> {
            let resolver = ReferenceResolver::new(&self.output, "wxcomponents", &self.patterns, "json");
            let seeds = seeds.iter().map(|(p, n)| ComponentId::new(*p, *n)).collect();
            resolver.resolve(seeds, &self.usings).await.keys()
        }
    }

    fn lx() -> LibraryPattern {
        LibraryPattern::new("lx-ui", "lx")
    }

    #[tokio::test]
    async fn test_unprefixed_usage_is_qualified() {
        let mut fx = Fixture::new(vec![lx()]);
        fx.component("lx-ui", "lx", "a", r#"{ "usingComponents": { "b": "../b/index" } }"#);
        fx.component("lx-ui", "lx", "b", "{}");

        assert_eq!(fx.resolve(&[("lx", "a")]).await, vec!["lx-a", "lx-b"]);
    }

    #[tokio::test]
    async fn test_no_seeds_resolves_nothing() {
        let mut fx = Fixture::new(vec![lx()]);
        fx.component("lx-ui", "lx", "a", r#"{ "usingComponents": { "b": "../b/index" } }"#);
        fx.component("lx-ui", "lx", "b", "{}");

        assert!(fx.resolve(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_cycles_terminate() {
        let mut fx = Fixture::new(vec![lx()]);
        fx.component("lx-ui", "lx", "a", r#"{ "usingComponents": { "lx-a": "./index", "lx-b": "../b/index" } }"#);
        fx.component("lx-ui", "lx", "b", r#"{ "usingComponents": { "a": "../a/index" } }"#);

        assert_eq!(fx.resolve(&[("lx", "b")]).await, vec!["lx-a", "lx-b"]);
    }

    #[tokio::test]
    async fn test_deep_chain() {
        let mut fx = Fixture::new(vec![lx()]);
        fx.component("lx-ui", "lx", "a", r#"{ "usingComponents": { "b": "../b/index" } }"#);
        fx.component("lx-ui", "lx", "b", r#"{ "usingComponents": { "c": "../c/index" } }"#);
        fx.component("lx-ui", "lx", "c", r#"{ "usingComponents": { "lx-d": "../d/index" } }"#);
        fx.component("lx-ui", "lx", "d", "{}");
        fx.component("lx-ui", "lx", "unused", "{}");

        assert_eq!(
            fx.resolve(&[("lx", "a")]).await,
            vec!["lx-a", "lx-b", "lx-c", "lx-d"]
        );
    }

    #[tokio::test]
    async fn test_first_party_usage_ignored() {
        let mut fx = Fixture::new(vec![lx()]);
        fx.component(
            "lx-ui",
            "lx",
            "a",
            r#"{ "usingComponents": { "card": "/components/card/index", "chart": "plugin://charts/chart" } }"#,
        );

        assert_eq!(fx.resolve(&[("lx", "a")]).await, vec!["lx-a"]);
    }

    #[tokio::test]
    async fn test_alias_resolved_through_path() {
        let mut fx = Fixture::new(vec![LibraryPattern::new("@vant/weapp", "van")]);
        fx.component("@vant/weapp", "van", "button", r#"{ "usingComponents": { "my-icon": "../icon/index" } }"#);
        fx.component("@vant/weapp", "van", "icon", "{}");

        assert_eq!(fx.resolve(&[("van", "button")]).await, vec!["van-button", "van-icon"]);
    }

    #[tokio::test]
    async fn test_pathless_usage_uses_owner_prefix() {
        let mut fx = Fixture::new(vec![lx()]);
        fx.component("lx-ui", "lx", "a", r#"{ "usingComponents": { "b": "" } }"#);
        fx.component("lx-ui", "lx", "b", "{}");

        assert_eq!(fx.resolve(&[("lx", "a")]).await, vec!["lx-a", "lx-b"]);
    }

    #[tokio::test]
    async fn test_broken_descriptor_declares_nothing() {
        let mut fx = Fixture::new(vec![lx()]);
        fx.component("lx-ui", "lx", "a", "{ this is not json");
        fx.component("lx-ui", "lx", "b", "{}");

        assert_eq!(fx.resolve(&[("lx", "a")]).await, vec!["lx-a"]);
    }

    #[tokio::test]
    async fn test_cross_library_reference() {
        let mut fx = Fixture::new(vec![lx(), LibraryPattern::new("@vant/weapp", "van")]);
        fx.component(
            "lx-ui",
            "lx",
            "a",
            r#"{ "usingComponents": { "van-icon": "/wxcomponents/@vant/weapp/icon/index" } }"#,
        );
        fx.component("@vant/weapp", "van", "icon", "{}");

        assert_eq!(fx.resolve(&[("lx", "a")]).await, vec!["lx-a", "van-icon"]);
    }

    #[test]
    fn test_reference_set_contains() {
        let set: ReferenceSet = vec![ComponentId::new("lx", "a")].into_iter().collect();
        assert!(set.contains(&ComponentId::new("lx", "a")));
        assert!(!set.contains(&ComponentId::new("lx", "b")));
        assert_eq!(set.keys(), vec!["lx-a"]);
    }
}
