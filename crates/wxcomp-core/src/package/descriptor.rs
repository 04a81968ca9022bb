use crate::core::{jsonc, WxcError, WxcResult};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// The subset of a component library's `package.json` needed to find its
/// distributable mini-program components.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    /// Directory holding the compiled mini-program components (e.g. `lib`)
    #[serde(default)]
    pub miniprogram: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

impl PackageDescriptor {
    /// Load package.json from a package directory
    pub fn load(dir: &Path) -> WxcResult<Self> {
        let path = dir.join("package.json");
        if !path.exists() {
            return Err(WxcError::Library(format!(
                "package.json not found in {}",
                dir.display()
            )));
        }

        let content = fs::read_to_string(&path)?;
        jsonc::parse(&content)
            .map_err(|e| WxcError::Library(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Directory (relative to the package) that holds the components
    ///
    /// Prefers the `miniprogram` field and falls back to the first `files` entry.
    pub fn entry_dir(&self) -> Option<&str> {
        self.miniprogram
            .as_deref()
            .filter(|dir| !dir.trim().is_empty())
            .or_else(|| self.files.first().map(String::as_str))
            .map(|dir| dir.trim_start_matches("./").trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_descriptor_with_miniprogram() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("package.json"),
            r#"{ "name": "@vant/weapp", "miniprogram": "lib", "files": ["dist", "lib"] }"#,
        )
        .unwrap();

        let descriptor = PackageDescriptor::load(temp.path()).unwrap();
        assert_eq!(descriptor.name.as_deref(), Some("@vant/weapp"));
        assert_eq!(descriptor.entry_dir(), Some("lib"));
    }

    #[test]
    fn test_entry_dir_falls_back_to_files() {
        let descriptor = PackageDescriptor {
            files: vec!["./miniprogram_dist/".to_string()],
            ..Default::default()
        };
        assert_eq!(descriptor.entry_dir(), Some("miniprogram_dist"));
    }

    #[test]
    fn test_entry_dir_none() {
        assert_eq!(PackageDescriptor::default().entry_dir(), None);
    }

    #[test]
    fn test_load_missing_descriptor() {
        let temp = TempDir::new().unwrap();
        let err = PackageDescriptor::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains("package.json not found"));
    }
}
