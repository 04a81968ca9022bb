use crate::config::LibraryPattern;
use crate::core::path::{join_slash, to_slash};
use crate::core::{WxcError, WxcResult};
use crate::library::locator::locate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use walkdir::WalkDir;

/// One library file staged for the output tree
#[derive(Debug, Clone)]
pub struct StagedFile {
    /// Library module the file belongs to
    pub module: String,
    /// Path relative to the output root: `<namespace>/<module>/<relative path>`
    pub filename: PathBuf,
    /// Where the file was read from
    pub source: PathBuf,
    pub data: Vec<u8>,
}

/// Read every file under `library_path` and stage it under `<namespace>/<module>/`
///
/// No extension filtering: markup, logic, style and descriptor files all go.
pub async fn collect(library_path: &Path, module: &str, namespace: &str) -> WxcResult<Vec<StagedFile>> {
    let destination = join_slash(&join_slash(Path::new(""), namespace), module);

    let mut sources = Vec::new();
    for entry in WalkDir::new(library_path).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() {
            sources.push(entry.into_path());
        }
    }
    sources.sort();

    let mut files = Vec::with_capacity(sources.len());
    for source in sources {
        let relative = source
            .strip_prefix(library_path)
            .map_err(|e| WxcError::Path(format!("{}: {}", source.display(), e)))?;
        let filename = join_slash(&destination, &to_slash(relative));
        let data = tokio::fs::read(&source).await?;
        files.push(StagedFile {
            module: module.to_string(),
            filename,
            source,
            data,
        });
    }

    Ok(files)
}

/// Locate and collect every configured library concurrently
///
/// A library that is missing or unreadable is logged and contributes nothing;
/// the others are still staged. Results come back in pattern order.
pub async fn collect_all(project_root: &Path, patterns: &[LibraryPattern], namespace: &str) -> Vec<StagedFile> {
    let project_root = Arc::new(project_root.to_path_buf());
    let namespace: Arc<str> = Arc::from(namespace);
    let mut join_set = JoinSet::new();

    for (index, pattern) in patterns.iter().enumerate() {
        let project_root = Arc::clone(&project_root);
        let namespace = Arc::clone(&namespace);
        let module = pattern.module.clone();
        join_set.spawn(async move {
            let Some(library_path) = locate(&project_root, &module) else {
                return (index, module, Ok(Vec::new()));
            };
            let result = collect(&library_path, &module, &namespace).await;
            (index, module, result)
        });
    }

    let mut per_library: Vec<(usize, Vec<StagedFile>)> = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, module, Ok(files))) => {
                tracing::info!(module = %module, files = files.len(), "collected library assets");
                per_library.push((index, files));
            }
            Ok((_, module, Err(e))) => {
                tracing::error!(module = %module, error = %e, "failed to collect library assets");
            }
            Err(e) => {
                tracing::error!(error = %e, "asset collection task failed");
            }
        }
    }

    per_library.sort_by_key(|(index, _)| *index);
    per_library.into_iter().flat_map(|(_, files)| files).collect()
}

/// Write staged files into the output tree, overwriting by path
pub async fn emit(output_dir: &Path, files: &[StagedFile]) -> WxcResult<usize> {
    for file in files {
        let target = output_dir.join(&file.filename);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &file.data).await?;
    }
    Ok(files.len())
}
