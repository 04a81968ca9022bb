use crate::config::ManifestScope;
use crate::core::jsonc;
use crate::core::{WxcError, WxcResult};
use crate::manifest::UsingComponents;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// A manifest file on disk (app.json or pages.json)
///
/// Holds the original text so that a save only rewrites the managed
/// `usingComponents` mapping and keeps comments and layout elsewhere.
#[derive(Debug, Clone)]
pub struct ManifestFile {
    path: PathBuf,
    scope: ManifestScope,
    source: String,
    document: Value,
}

impl ManifestFile {
    /// Load a manifest, or `None` when the file does not exist yet
    pub async fn load(path: &Path, scope: ManifestScope) -> WxcResult<Option<Self>> {
        let source = match tokio::fs::read_to_string(path).await {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Self::from_source(path, scope, source).map(Some)
    }

    /// Build a manifest from text already in memory
    pub fn from_source(path: &Path, scope: ManifestScope, source: String) -> WxcResult<Self> {
        let document = jsonc::parse_value(&source).map_err(|e| {
            WxcError::Manifest(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        if !document.is_object() {
            return Err(WxcError::Manifest(format!(
                "{} is not an object at the top level",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            scope,
            source,
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The managed mapping; empty when the manifest has none yet
    pub fn using_components(&self) -> WxcResult<UsingComponents> {
        let mut node = &self.document;
        for key in self.scope.key_path() {
            match node.get(key) {
                Some(next) => node = next,
                None => return Ok(UsingComponents::new()),
            }
        }

        match node {
            Value::Object(map) => Ok(UsingComponents::from_map(map.clone())),
            Value::Null => Ok(UsingComponents::new()),
            _ => Err(WxcError::Manifest(format!(
                "'{}' in {} is not an object",
                self.scope.key_path().join("."),
                self.path.display()
            ))),
        }
    }

    /// Render the document text with `usings` as the managed mapping
    pub fn render(&self, usings: &UsingComponents) -> WxcResult<String> {
        let key_path = self.scope.key_path();

        if let Some(span) = jsonc::find_member_span(&self.source, key_path) {
            let unit = jsonc::detect_indent(&self.source);
            if self.source[span.clone()].starts_with('{') {
                return jsonc::update_object(&self.source, span, usings.as_map(), &unit);
            }
            // `null`: replace it with a fresh object
            let indent = jsonc::line_indent(&self.source, span.start).to_string();
            let rendered = jsonc::render_object(usings.as_map(), &indent, &unit)?;
            return Ok(jsonc::splice(&self.source, span, &rendered));
        }

        // The mapping is missing, so the whole document is re-serialized
        let mut document = self.document.clone();
        set_path(&mut document, key_path, Value::Object(usings.as_map().clone()))?;
        jsonc::to_string_pretty(&document, &jsonc::detect_indent(&self.source))
    }

    /// Write `usings` back to disk; returns false when nothing changed
    pub async fn save(&mut self, usings: &UsingComponents) -> WxcResult<bool> {
        // Map equality ignores order, so a pure reordering never rewrites the file
        if self.using_components()? == *usings {
            return Ok(false);
        }

        let rendered = self.render(usings)?;
        if rendered == self.source {
            return Ok(false);
        }

        tokio::fs::write(&self.path, &rendered).await?;
        tracing::debug!(path = %self.path.display(), "manifest written");

        self.document = jsonc::parse_value(&rendered)?;
        self.source = rendered;
        Ok(true)
    }
}

fn set_path(document: &mut Value, key_path: &[&str], value: Value) -> WxcResult<()> {
    let (last, parents) = key_path
        .split_last()
        .ok_or_else(|| WxcError::Manifest("Empty manifest key path".to_string()))?;

    let mut node = document;
    for key in parents {
        let map = node
            .as_object_mut()
            .ok_or_else(|| WxcError::Manifest(format!("'{}' parent is not an object", key)))?;
        node = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let map = node
        .as_object_mut()
        .ok_or_else(|| WxcError::Manifest(format!("'{}' parent is not an object", last)))?;
    map.insert(last.to_string(), value);
    Ok(())
}
