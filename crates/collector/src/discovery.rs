//! Project and SDK discovery: which files to scan, where the platform
//! declarations live, and which directories of a batch root are apps.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Platform declaration artifact, relative to the SDK root. The analysis
/// engine reads this file while building a scene.
pub const GLOBAL_DECLS_REL_PATH: &str = "api/@internal/full/global.d.ts";

/// Source extensions the scan considers application code.
const SOURCE_EXTENSIONS: [&str; 2] = ["ets", "ts"];

/// Directory names that never contain first-party application sources.
const EXCLUDED_DIRS: [&str; 4] = ["node_modules", "oh_modules", "build", ".hvigor"];

/// Directory names holding test sources, skipped unless requested.
const TEST_DIRS: [&str; 2] = ["test", "ohosTest"];

/// Absolute path of the declaration artifact under an SDK root.
pub fn declaration_artifact(sdk_root: &Path) -> PathBuf {
    sdk_root.join(GLOBAL_DECLS_REL_PATH)
}

#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string())
    }

    /// Enumerates application source files in a stable order, skipping
    /// dependency and build directories, and test trees unless asked for.
    pub fn app_sources(&self, include_tests: bool) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                if EXCLUDED_DIRS.iter().any(|d| name == *d) {
                    return false;
                }
                if !include_tests && TEST_DIRS.iter().any(|d| name == *d) {
                    return false;
                }
                true
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
                    .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect()
    }
}

/// Immediate subdirectories of `parent` that look like app projects (they
/// carry a `src/` tree). Sorted by name so batch runs are reproducible.
pub fn list_app_dirs(parent: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(parent) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && path.join("src").is_dir())
        .collect();
    dirs.sort();
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn app_sources_skips_dependencies_and_tests() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("src/main/ets/pages/Index.ets"));
        touch(&root.join("src/main/ets/util.ts"));
        touch(&root.join("src/ohosTest/ets/test.ets"));
        touch(&root.join("node_modules/dep/index.ts"));
        touch(&root.join("build/out.ets"));
        touch(&root.join("src/main/resources/strings.json"));

        let project = Project::new(root);
        let sources = project.app_sources(false);
        assert_eq!(sources.len(), 2);
        assert!(sources.iter().all(|p| {
            let s = p.to_string_lossy();
            !s.contains("node_modules") && !s.contains("ohosTest") && !s.contains("build")
        }));

        let with_tests = project.app_sources(true);
        assert_eq!(with_tests.len(), 3);
    }

    #[test]
    fn list_app_dirs_requires_src_tree() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("app_b/src/main.ets"));
        touch(&dir.path().join("app_a/src/main.ets"));
        touch(&dir.path().join("not_an_app/readme.md"));

        let apps = list_app_dirs(dir.path());
        let names: Vec<_> = apps
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["app_a", "app_b"]);
    }

    #[test]
    fn list_app_dirs_on_missing_parent_is_empty() {
        assert!(list_app_dirs(Path::new("/does/not/exist")).is_empty());
    }

    #[test]
    fn declaration_artifact_is_under_sdk_root() {
        let path = declaration_artifact(Path::new("/sdk/10"));
        assert_eq!(
            path,
            PathBuf::from("/sdk/10/api/@internal/full/global.d.ts")
        );
    }
}
