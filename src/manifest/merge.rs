use crate::config::{BuildContext, Config, LibraryPattern};
use crate::core::path::{staged_library_dir, usage_value, ENTRY_STEM};
use crate::core::{WxcError, WxcResult};
use crate::library::locate;
use crate::manifest::{is_component_name, ComponentId, ManifestFile, UsingComponents};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Components found for one library during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLibrary {
    pub pattern: LibraryPattern,
    /// Component names, sorted
    pub components: Vec<String>,
}

/// Outcome of a merge against the manifest file
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// False when there was no manifest to merge into
    pub manifest_found: bool,
    pub removed: Vec<String>,
    pub registered: Vec<String>,
    pub written: bool,
}

/// Merge discovered library components into a `usingComponents` mapping
///
/// Every owned entry for a configured prefix is dropped first, so components
/// removed from a library between builds do not linger. Each discovered
/// component is then registered as `prefix-name -> /<namespace>/<module>/<name>/index`.
/// Entries that are not owned are left exactly where they are.
pub fn merge(
    mut usings: UsingComponents,
    patterns: &[LibraryPattern],
    libraries: &[DiscoveredLibrary],
    namespace: &str,
) -> (UsingComponents, Vec<String>) {
    let stale: Vec<String> = usings
        .owned(patterns, namespace)
        .into_iter()
        .map(|entry| entry.key)
        .collect();
    for key in &stale {
        usings.remove(key);
    }

    for library in libraries {
        for component in &library.components {
            let id = ComponentId::new(&library.pattern.prefix, component);
            usings.insert(
                id.key(),
                usage_value(namespace, &library.pattern.module, component),
            );
        }
    }

    (usings, stale)
}

/// Discover the components of one library
///
/// A component is a direct subdirectory of the located library holding an
/// entry descriptor (`index.<ext>`). It only counts when the same directory is
/// also present in the staged output, so something dropped upstream is never
/// registered.
pub async fn discover(
    project_root: &Path,
    output_dir: &Path,
    namespace: &str,
    pattern: &LibraryPattern,
    descriptor_ext: &str,
) -> WxcResult<Vec<String>> {
    let Some(library_path) = locate(project_root, &pattern.module) else {
        return Ok(Vec::new());
    };

    let source = component_dirs(&library_path, Some(descriptor_ext)).await?;
    let staged_dir = staged_library_dir(output_dir, namespace, &pattern.module);
    let staged = match component_dirs(&staged_dir, None).await {
        Ok(staged) => staged,
        Err(WxcError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
        Err(e) => return Err(e),
    };

    let mut components = Vec::new();
    for name in source {
        if !staged.contains(&name) {
            tracing::debug!(module = %pattern.module, component = %name, "component not staged, skipping");
            continue;
        }
        if !is_component_name(&name) {
            tracing::debug!(module = %pattern.module, component = %name, "directory name is not a valid component name");
            continue;
        }
        components.push(name);
    }
    Ok(components)
}

/// Names of subdirectories of `dir`, optionally only those holding `index.<ext>`
async fn component_dirs(dir: &Path, descriptor_ext: Option<&str>) -> WxcResult<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let path = entry.path();
        if let Some(ext) = descriptor_ext {
            let descriptor: PathBuf = path.join(format!("{}.{}", ENTRY_STEM, ext));
            if !tokio::fs::try_exists(&descriptor).await.unwrap_or(false) {
                continue;
            }
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}

/// Discover every configured library concurrently
///
/// A failing library is logged and contributes no components; the others are
/// unaffected. Results come back in pattern order.
pub async fn discover_all(config: &Config, ctx: &BuildContext) -> Vec<DiscoveredLibrary> {
    let project_root = Arc::new(ctx.project_root.clone());
    let output_dir = Arc::new(ctx.output_dir.clone());
    let namespace: Arc<str> = Arc::from(config.namespace());
    let descriptor_ext: Arc<str> = Arc::from(config.descriptor_ext.as_str());

    let mut join_set = JoinSet::new();
    for (index, pattern) in config.patterns.iter().cloned().enumerate() {
        let project_root = Arc::clone(&project_root);
        let output_dir = Arc::clone(&output_dir);
        let namespace = Arc::clone(&namespace);
        let descriptor_ext = Arc::clone(&descriptor_ext);
        join_set.spawn(async move {
            let result = discover(&project_root, &output_dir, &namespace, &pattern, &descriptor_ext).await;
            (index, pattern, result)
        });
    }

    let mut libraries = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, pattern, Ok(components))) => {
                libraries.push((index, DiscoveredLibrary { pattern, components }));
            }
            Ok((index, pattern, Err(e))) => {
                tracing::error!(module = %pattern.module, error = %e, "component discovery failed");
                libraries.push((index, DiscoveredLibrary { pattern, components: Vec::new() }));
            }
            Err(e) => {
                tracing::error!(error = %e, "component discovery task failed");
            }
        }
    }

    libraries.sort_by_key(|(index, _)| *index);
    libraries.into_iter().map(|(_, library)| library).collect()
}

/// Merge every configured library into the manifest file on disk
///
/// A missing manifest makes this a no-op.
pub async fn merge_manifest(config: &Config, ctx: &BuildContext) -> WxcResult<MergeReport> {
    let Some(mut manifest) = ManifestFile::load(&ctx.manifest_path, config.manifest.scope).await? else {
        tracing::info!(path = %ctx.manifest_path.display(), "no manifest yet, skipping merge");
        return Ok(MergeReport::default());
    };

    let libraries = discover_all(config, ctx).await;
    let before = manifest.using_components()?;
    let (usings, removed) = merge(before, &config.patterns, &libraries, config.namespace());

    let registered = libraries
        .iter()
        .flat_map(|library| {
            library
                .components
                .iter()
                .map(move |component| ComponentId::new(&library.pattern.prefix, component).key())
        })
        .collect();

    let written = manifest.save(&usings).await?;
    Ok(MergeReport {
        manifest_found: true,
        removed,
        registered,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path::package_dir;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn lx() -> LibraryPattern {
        LibraryPattern::new("lx-ui", "lx")
    }

    #[test]
    fn test_merge_replaces_owned_entries_only() {
        let mut usings = UsingComponents::new();
        usings.insert("my-card", "/components/card/index");
        usings.insert("lx-old", "/wxcomponents/lx-ui/old/index");
        usings.insert("lx-local", "/components/lx-local/index");

        let libraries = vec![DiscoveredLibrary {
            pattern: lx(),
            components: vec!["a".to_string(), "b".to_string()],
        }];
        let (merged, removed) = merge(usings, &[lx()], &libraries, "wxcomponents");

        assert_eq!(removed, vec!["lx-old"]);
        let keys: Vec<_> = merged.keys().cloned().collect();
        assert_eq!(keys, vec!["my-card", "lx-local", "lx-a", "lx-b"]);
        assert_eq!(merged.get("lx-a"), Some("/wxcomponents/lx-ui/a/index"));
        assert_eq!(merged.get("lx-local"), Some("/components/lx-local/index"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let libraries = vec![DiscoveredLibrary {
            pattern: lx(),
            components: vec!["a".to_string(), "b".to_string()],
        }];
        let mut usings = UsingComponents::new();
        usings.insert("my-card", "/components/card/index");

        let (once, _) = merge(usings, &[lx()], &libraries, "wxcomponents");
        let (twice, _) = merge(once.clone(), &[lx()], &libraries, "wxcomponents");
        let once_keys: Vec<_> = once.keys().cloned().collect();
        let twice_keys: Vec<_> = twice.keys().cloned().collect();
        assert_eq!(once, twice);
        assert_eq!(once_keys, twice_keys);
    }

    #[tokio::test]
    async fn test_discover_requires_staged_directory() {
        let temp = TempDir::new().unwrap();
        let lib = package_dir(temp.path(), "lx-ui");
        write(&lib.join("package.json"), r#"{ "miniprogram": "lib" }"#);
        write(&lib.join("lib/a/index.json"), "{}");
        write(&lib.join("lib/b/index.json"), "{}");
        write(&lib.join("lib/common/index.wxss"), "");

        let output = temp.path().join("dist");
        write(&output.join("wxcomponents/lx-ui/a/index.json"), "{}");

        let components = discover(temp.path(), &output, "wxcomponents", &lx(), "json")
            .await
            .unwrap();
        assert_eq!(components, vec!["a"]);
    }

    #[tokio::test]
    async fn test_discover_missing_library_is_empty() {
        let temp = TempDir::new().unwrap();
        let components = discover(temp.path(), temp.path(), "wxcomponents", &lx(), "json")
            .await
            .unwrap();
        assert!(components.is_empty());
    }
}
