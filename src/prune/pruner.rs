use crate::config::LibraryPattern;
use crate::core::path::{resolve_usage_value, staged_library_dir};
use crate::manifest::{ComponentId, UsingComponents};
use crate::resolver::ReferenceSet;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// An owned manifest entry that nothing references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoomedComponent {
    pub id: ComponentId,
    pub key: String,
    pub value: String,
    /// Staged component directory to delete, or `None` when another kept
    /// entry still points at the same directory
    pub dir: Option<PathBuf>,
}

/// What a prune would remove
#[derive(Debug, Clone, Default)]
pub struct PrunePlan {
    pub doomed: Vec<DoomedComponent>,
    /// Owned entries that stay because they are referenced
    pub kept: Vec<String>,
}

/// What a prune actually removed
#[derive(Debug, Clone, Default)]
pub struct PruneReport {
    /// False when there was no manifest to prune
    pub manifest_found: bool,
    pub kept: Vec<String>,
    pub removed: Vec<String>,
    pub deleted_paths: Vec<PathBuf>,
    /// Keys whose directory could not be deleted, with the error
    pub failed: Vec<(String, String)>,
    pub written: bool,
}

/// Decide which owned entries go
///
/// Only entries owned by the engine are candidates; everything else in the
/// manifest is left alone. Must run on the complete reference closure.
pub fn plan(
    usings: &UsingComponents,
    references: &ReferenceSet,
    patterns: &[LibraryPattern],
    namespace: &str,
    output_dir: &Path,
) -> PrunePlan {
    let mut plan = PrunePlan::default();
    let mut kept_dirs = HashSet::new();
    let mut candidates = Vec::new();

    for entry in usings.owned(patterns, namespace) {
        let dir = component_dir(output_dir, &entry.value);
        if references.contains(&entry.id) {
            kept_dirs.insert(dir);
            plan.kept.push(entry.key);
            continue;
        }

        let Some(pattern) = patterns.iter().find(|p| p.prefix == entry.id.prefix) else {
            continue;
        };
        let library_dir = staged_library_dir(output_dir, namespace, &pattern.module);
        if !dir.starts_with(&library_dir) || dir == library_dir {
            tracing::warn!(
                key = %entry.key,
                value = %entry.value,
                "entry does not point at a component directory of its library, leaving it alone"
            );
            plan.kept.push(entry.key);
            continue;
        }
        candidates.push((entry, dir));
    }

    for (entry, dir) in candidates {
        let dir = (!kept_dirs.contains(&dir)).then_some(dir);
        plan.doomed.push(DoomedComponent {
            id: entry.id,
            key: entry.key,
            value: entry.value,
            dir,
        });
    }

    plan
}

/// Delete doomed component directories and their manifest entries
///
/// A key is only dropped once its directory is confirmed gone. When deletion
/// fails the key stays, so the manifest never points at deleted files.
pub async fn apply(plan: &PrunePlan, mut usings: UsingComponents) -> (UsingComponents, PruneReport) {
    let mut report = PruneReport {
        manifest_found: true,
        kept: plan.kept.clone(),
        ..Default::default()
    };

    for doomed in &plan.doomed {
        if let Some(dir) = &doomed.dir {
            match tokio::fs::remove_dir_all(dir).await {
                Ok(()) => {
                    tracing::info!(component = %doomed.id, dir = %dir.display(), "removed unused component");
                    report.deleted_paths.push(dir.clone());
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(component = %doomed.id, "component directory already gone");
                }
                Err(e) => {
                    tracing::warn!(component = %doomed.id, dir = %dir.display(), error = %e, "failed to remove component directory");
                    report.failed.push((doomed.key.clone(), e.to_string()));
                    continue;
                }
            }
        }

        usings.remove(&doomed.key);
        report.removed.push(doomed.key.clone());
    }

    (usings, report)
}

/// `<output>/<value>` minus its entry stem: the component's directory
fn component_dir(output_dir: &Path, value: &str) -> PathBuf {
    let entry = resolve_usage_value(output_dir, value);
    entry.parent().map(Path::to_path_buf).unwrap_or(entry)
}
