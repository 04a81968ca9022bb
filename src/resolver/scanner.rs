use crate::config::LibraryPattern;
use crate::core::path::staged_root;
use crate::core::{WxcError, WxcResult};
use crate::manifest::component_id::NAME_CLASS;
use crate::manifest::ComponentId;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds opening tags of library components in compiled markup
pub struct TagScanner {
    pattern: Regex,
    patterns: Vec<LibraryPattern>,
}

impl TagScanner {
    /// Build one matcher for all configured prefixes: `<((?:p1|p2)-[a-z0-9_-]+)`
    pub fn new(patterns: &[LibraryPattern]) -> WxcResult<Self> {
        let alternatives = patterns
            .iter()
            .map(|p| regex::escape(&p.prefix))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"<((?:{})-{}+)", alternatives, NAME_CLASS))
            .map_err(|e| WxcError::Config(format!("Invalid tag pattern: {}", e)))?;

        Ok(Self {
            pattern,
            patterns: patterns.to_vec(),
        })
    }

    /// Component ids of every prefixed tag opened in `content`
    pub fn scan(&self, content: &str) -> BTreeSet<ComponentId> {
        self.pattern
            .captures_iter(content)
            .filter_map(|cap| cap.get(1))
            .filter_map(|m| ComponentId::parse(m.as_str(), &self.patterns))
            .collect()
    }
}

/// Markup files of the compiled output, excluding the staged namespace
pub fn markup_files(output_dir: &Path, namespace: &str, markup_ext: &str) -> Vec<PathBuf> {
    let staged = staged_root(output_dir, namespace);

    WalkDir::new(output_dir)
        .into_iter()
        .filter_entry(|entry| entry.path() != staged)
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == markup_ext)
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Seed set: every library component used directly by compiled markup
pub async fn scan_markup(
    output_dir: &Path,
    namespace: &str,
    markup_ext: &str,
    scanner: &TagScanner,
) -> WxcResult<BTreeSet<ComponentId>> {
    let mut seeds = BTreeSet::new();
    for file in markup_files(output_dir, namespace, markup_ext) {
        let content = match tokio::fs::read(&file).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "could not read markup file");
                continue;
            }
        };
        let found = scanner.scan(&content);
        if !found.is_empty() {
            tracing::debug!(file = %file.display(), components = found.len(), "library tags found");
        }
        seeds.extend(found);
    }
    Ok(seeds)
}
