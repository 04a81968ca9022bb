use crate::core::path::{join_slash, package_dir};
use crate::core::PackageDescriptor;
use std::path::{Path, PathBuf};

/// Find the directory holding a library's distributable components
///
/// Reads `node_modules/<module>/package.json` and returns the directory named
/// by its `miniprogram` field, or by the first `files` entry. A library that
/// is not installed, or whose descriptor names no directory, yields `None`:
/// it simply contributes no components.
pub fn locate(project_root: &Path, module: &str) -> Option<PathBuf> {
    let dir = package_dir(project_root, module);
    if !dir.is_dir() {
        tracing::warn!(module, "component library is not installed");
        return None;
    }

    let descriptor = match PackageDescriptor::load(&dir) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            tracing::warn!(module, error = %e, "could not read library package.json");
            return None;
        }
    };

    let Some(entry) = descriptor.entry_dir() else {
        tracing::warn!(module, "library package.json has no entry directory (miniprogram or files)");
        return None;
    };

    let library_path = join_slash(&dir, entry);
    if !library_path.is_dir() {
        tracing::warn!(
            module,
            path = %library_path.display(),
            "library entry directory does not exist"
        );
        return None;
    }

    tracing::debug!(module, path = %library_path.display(), "located component library");
    Some(library_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn install(root: &Path, module: &str, package_json: &str, dirs: &[&str]) {
        let dir = package_dir(root, module);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), package_json).unwrap();
        for sub in dirs {
            fs::create_dir_all(dir.join(sub)).unwrap();
        }
    }

    #[test]
    fn test_locate_miniprogram_field() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "@vant/weapp", r#"{ "miniprogram": "lib", "files": ["dist"] }"#, &["lib", "dist"]);

        let path = locate(temp.path(), "@vant/weapp").unwrap();
        assert_eq!(path, temp.path().join("node_modules/@vant/weapp/lib"));
    }

    #[test]
    fn test_locate_falls_back_to_files() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "lx-ui", r#"{ "files": ["miniprogram_dist"] }"#, &["miniprogram_dist"]);

        let path = locate(temp.path(), "lx-ui").unwrap();
        assert!(path.ends_with("miniprogram_dist"));
    }

    #[test]
    fn test_locate_missing_library() {
        let temp = TempDir::new().unwrap();
        assert!(locate(temp.path(), "not-installed").is_none());
    }

    #[test]
    fn test_locate_without_entry_dir() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "bare", r#"{ "name": "bare" }"#, &[]);
        assert!(locate(temp.path(), "bare").is_none());
    }
}
