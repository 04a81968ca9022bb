use crate::core::error::{WxcError, WxcResult};
use std::path::{Component, Path, PathBuf};

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "wxcomp.yaml";

/// Default staged-component namespace inside the output tree
pub const DEFAULT_NAMESPACE: &str = "wxcomponents";

/// Entry file stem shared by every staged component (`index.json`, `index.wxml`, ...)
pub const ENTRY_STEM: &str = "index";

/// Get the node_modules directory for a project (./node_modules)
pub fn node_modules_dir(project_root: &Path) -> PathBuf {
    project_root.join("node_modules")
}

/// Get the installed directory of a package (./node_modules/<module>)
///
/// Scoped modules such as `@vant/weapp` map onto nested directories.
pub fn package_dir(project_root: &Path, module: &str) -> PathBuf {
    join_slash(&node_modules_dir(project_root), module)
}

/// Get the default compiled output directory
///
/// - production: ./dist/build/mp-weixin
/// - development: ./dist/dev/mp-weixin
pub fn default_output_dir(project_root: &Path, production: bool) -> PathBuf {
    let mode = if production { "build" } else { "dev" };
    project_root.join("dist").join(mode).join("mp-weixin")
}

/// Get the staged-component root (<output>/<namespace>)
pub fn staged_root(output_dir: &Path, namespace: &str) -> PathBuf {
    join_slash(output_dir, namespace)
}

/// Get the staged directory of one library (<output>/<namespace>/<module>)
pub fn staged_library_dir(output_dir: &Path, namespace: &str, module: &str) -> PathBuf {
    join_slash(&staged_root(output_dir, namespace), module)
}

/// Build the manifest value for a staged component: `/<namespace>/<module>/<name>/index`
pub fn usage_value(namespace: &str, module: &str, component: &str) -> String {
    format!(
        "/{}/{}/{}/{}",
        namespace.trim_matches('/'),
        module.trim_matches('/'),
        component,
        ENTRY_STEM
    )
}

/// Prefix every owned manifest value starts with: `/<namespace>/`
pub fn namespace_value_prefix(namespace: &str) -> String {
    format!("/{}/", namespace.trim_matches('/'))
}

/// Resolve an absolute-from-output-root manifest value to a filesystem path
///
/// `/wxcomponents/lib/button/index` becomes `<output>/wxcomponents/lib/button/index`.
pub fn resolve_usage_value(output_dir: &Path, value: &str) -> PathBuf {
    normalize_path(&join_slash(output_dir, value.trim_start_matches('/')))
}

/// Join a forward-slash separated relative path onto a base path
pub fn join_slash(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |acc, segment| acc.join(segment))
}

/// Render a relative path with forward slashes, whatever the platform
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Find the project root by looking for wxcomp.yaml in `start` or its parents
pub fn find_project_root(start: &Path) -> WxcResult<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }

        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            return Err(WxcError::Config(format!(
                "Could not find {} in {} or parents",
                CONFIG_FILE,
                start.display()
            )));
        }
    }
}

/// Lexically normalize a path: drops `.` and folds `..` into its parent
///
/// Does not touch the filesystem, so it works for paths that do not exist yet.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_project_root() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("project");
        fs::create_dir_all(&project_dir).unwrap();
        fs::write(project_dir.join(CONFIG_FILE), "name: wxcomponents\n").unwrap();

        let found = find_project_root(&project_dir.join("subdir")).unwrap();
        assert_eq!(found, project_dir);
    }

    #[test]
    fn test_usage_value_scoped_module() {
        assert_eq!(
            usage_value("wxcomponents", "@vant/weapp", "button"),
            "/wxcomponents/@vant/weapp/button/index"
        );
    }

    #[test]
    fn test_resolve_usage_value() {
        let out = Path::new("/out");
        assert_eq!(
            resolve_usage_value(out, "/wxcomponents/lib/a/index"),
            PathBuf::from("/out/wxcomponents/lib/a/index")
        );
    }

    #[test]
    fn test_normalize_path_parent_dirs() {
        let p = Path::new("/out/wxcomponents/lib/a/../b/./index");
        assert_eq!(normalize_path(p), PathBuf::from("/out/wxcomponents/lib/b/index"));
    }

    #[test]
    fn test_package_dir_scoped() {
        let root = Path::new("/proj");
        assert_eq!(
            package_dir(root, "@vant/weapp"),
            PathBuf::from("/proj/node_modules/@vant/weapp")
        );
    }
}
