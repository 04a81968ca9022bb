use crate::core::path::{default_output_dir, find_project_root, join_slash, CONFIG_FILE, DEFAULT_NAMESPACE};
use crate::core::{WxcError, WxcResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Project configuration, read from wxcomp.yaml
///
/// ```yaml
/// name: wxcomponents
/// patterns:
///   - module: "@vant/weapp"
///     prefix: van
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Namespace directory inside the output tree that receives staged components
    #[serde(default = "default_namespace")]
    pub name: String,

    /// Component libraries to stage, in registration order
    #[serde(default)]
    pub patterns: Vec<LibraryPattern>,

    /// Compiled output directory, relative to the project root
    ///
    /// Defaults to dist/build/mp-weixin for production builds and
    /// dist/dev/mp-weixin otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,

    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Extension of compiled markup files scanned for component tags
    #[serde(default = "default_markup_ext")]
    pub markup_ext: String,

    /// Extension of component descriptor files
    #[serde(default = "default_descriptor_ext")]
    pub descriptor_ext: String,
}

/// One configured component library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryPattern {
    /// Package name under node_modules (e.g. `@vant/weapp`)
    #[serde(alias = "name")]
    pub module: String,
    /// Tag prefix for the library's registered components (e.g. `van`)
    #[serde(alias = "useNamePreFix")]
    pub prefix: String,
}

impl LibraryPattern {
    pub fn new(module: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            prefix: prefix.into(),
        }
    }
}

/// Where the managed `usingComponents` mapping lives
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Manifest path relative to the project root (defaults to <output>/app.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default)]
    pub scope: ManifestScope,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestScope {
    /// Top-level `usingComponents` (app.json)
    #[default]
    App,
    /// `globalStyle.usingComponents` (pages.json)
    GlobalStyle,
}

impl ManifestScope {
    /// Key path of the managed mapping inside the manifest document
    pub fn key_path(&self) -> &'static [&'static str] {
        match self {
            ManifestScope::App => &["usingComponents"],
            ManifestScope::GlobalStyle => &["globalStyle", "usingComponents"],
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_markup_ext() -> String {
    "wxml".to_string()
}

fn default_descriptor_ext() -> String {
    "json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_namespace(),
            patterns: Vec::new(),
            output_dir: None,
            manifest: ManifestConfig::default(),
            markup_ext: default_markup_ext(),
            descriptor_ext: default_descriptor_ext(),
        }
    }
}

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> WxcResult<Self> {
        if !path.exists() {
            return Err(WxcError::Config(format!(
                "{} not found at {}",
                CONFIG_FILE,
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        Ok(config)
    }

    /// Parse and validate config text
    pub fn parse(content: &str) -> WxcResult<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Find wxcomp.yaml from `start` upwards and load it
    ///
    /// Returns the project root (the directory holding the config) with it.
    pub fn discover(start: &Path) -> WxcResult<(PathBuf, Self)> {
        let root = find_project_root(start)?;
        let config = Self::load(&root.join(CONFIG_FILE))?;
        Ok((root, config))
    }

    /// Validate the configuration
    pub fn validate(&self) -> WxcResult<()> {
        let namespace = self.name.trim_matches('/');
        if namespace.is_empty() {
            return Err(WxcError::Config("Namespace 'name' cannot be empty".to_string()));
        }
        if has_relative_segment(namespace) {
            return Err(WxcError::Config(format!(
                "Namespace '{}' must not contain relative segments",
                self.name
            )));
        }

        if self.patterns.is_empty() {
            return Err(WxcError::Config(
                "Configuration needs at least one pattern".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for pattern in &self.patterns {
            if pattern.module.trim().is_empty() {
                return Err(WxcError::Config(
                    "Pattern module cannot be empty".to_string(),
                ));
            }
            if has_relative_segment(&pattern.module) {
                return Err(WxcError::Config(format!(
                    "Module '{}' must not contain relative segments",
                    pattern.module
                )));
            }
            if !is_valid_prefix(&pattern.prefix) {
                return Err(WxcError::Config(format!(
                    "Invalid prefix '{}' for module '{}'",
                    pattern.prefix, pattern.module
                )));
            }
            if !seen.insert(pattern.prefix.as_str()) {
                return Err(WxcError::Config(format!(
                    "Duplicate prefix '{}'",
                    pattern.prefix
                )));
            }
        }

        for (field, ext) in [("markup_ext", &self.markup_ext), ("descriptor_ext", &self.descriptor_ext)] {
            if ext.is_empty() || ext.contains('.') || ext.contains('/') {
                return Err(WxcError::Config(format!(
                    "{} must be a bare extension such as 'wxml', got '{}'",
                    field, ext
                )));
            }
        }

        Ok(())
    }

    /// Staged-component namespace without surrounding slashes
    pub fn namespace(&self) -> &str {
        self.name.trim_matches('/')
    }

    /// Resolve the runtime paths for one build
    pub fn context(&self, project_root: &Path, production: bool, output_override: Option<&Path>) -> BuildContext {
        let output_dir = match (output_override, &self.output_dir) {
            (Some(dir), _) => project_root.join(dir),
            (None, Some(dir)) => join_slash(project_root, dir),
            (None, None) => default_output_dir(project_root, production),
        };
        let manifest_path = match &self.manifest.path {
            Some(path) => join_slash(project_root, path),
            None => output_dir.join("app.json"),
        };

        BuildContext {
            project_root: project_root.to_path_buf(),
            output_dir,
            manifest_path,
            production,
        }
    }
}

fn has_relative_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == ".." || segment == ".")
}

/// `^[a-z][a-z0-9]*(-[a-z0-9]+)*$`
fn is_valid_prefix(prefix: &str) -> bool {
    let mut segments = prefix.split('-');
    let first_ok = segments
        .next()
        .map(|s| s.starts_with(|c: char| c.is_ascii_lowercase()))
        .unwrap_or(false);
    first_ok
        && prefix.split('-').all(|s| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

/// Paths and mode for one build run
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub project_root: PathBuf,
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub production: bool,
}
