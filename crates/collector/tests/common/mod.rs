//! On-disk fixtures and a canned scene provider shared by the integration
//! tests.

#![allow(dead_code)]

use anyhow::{bail, Result};
use apiscan_collector::scene::{
    ClassSignature, ControlFlowGraph, InvokeStmt, LineColPosition, MethodSignature,
    MethodSubSignature, Scene, SceneBuildConfig, SceneClass, SceneFile, SceneMethod,
    SceneProvider, Stmt,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const ORIGINAL_DECLS: &str = "import { Context } from './context';\n\
export declare function getContext(): Context;\n\
declare namespace audio {\n    function getAudioManager(): AudioManager;\n}\n";

/// Lays out an SDK root with the platform declaration file and returns the
/// declaration file's path.
pub fn make_sdk(root: &Path) -> PathBuf {
    let decls = root.join("api/@internal/full/global.d.ts");
    std::fs::create_dir_all(decls.parent().unwrap()).unwrap();
    std::fs::write(&decls, ORIGINAL_DECLS).unwrap();
    decls
}

/// Creates an app project directory with one source file and returns its
/// root.
pub fn make_project(parent: &Path, name: &str) -> PathBuf {
    let root = parent.join(name);
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::write(root.join("src/main.ets"), "// app code\n").unwrap();
    root
}

/// Builds a scene whose single file contains one invocation per
/// `(type_name, method, line)` entry.
pub fn scene_for(project_root: &Path, calls: &[(&str, &str, u32)]) -> Scene {
    let source_path = project_root.join("src/main.ets");
    let stmts = calls
        .iter()
        .map(|(type_name, method, line)| {
            Stmt::Invoke(InvokeStmt {
                callee: MethodSignature {
                    declaring_class: ClassSignature {
                        class_name: type_name.to_string(),
                        declaring_file: Some(format!("@ohos.{}.d.ts", type_name.to_lowercase())),
                        declaring_namespace: None,
                    },
                    sub_signature: MethodSubSignature {
                        method_name: method.to_string(),
                        raw_text: format!("{}(): void;", method),
                    },
                },
                position: LineColPosition { line: *line, col: 1 },
            })
        })
        .collect();

    Scene {
        project_name: project_root
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned(),
        real_project_dir: project_root.to_string_lossy().into_owned(),
        files: vec![SceneFile {
            name: "src/main.ets".to_string(),
            path: source_path.to_string_lossy().into_owned(),
            classes: vec![SceneClass {
                name: "Entry".to_string(),
                methods: vec![SceneMethod {
                    name: "run".to_string(),
                    cfg: Some(ControlFlowGraph { stmts }),
                }],
            }],
        }],
    }
}

/// Serves canned scenes keyed by project root; optionally snapshots the
/// declaration artifact's content at scene-build time so tests can assert
/// the engine saw the mutated file.
pub struct FixtureProvider {
    scenes: HashMap<PathBuf, Scene>,
    watch_decls: Option<PathBuf>,
    build_delay: Option<std::time::Duration>,
    pub observed_decls: Mutex<Vec<String>>,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self {
            scenes: HashMap::new(),
            watch_decls: None,
            build_delay: None,
            observed_decls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_scene(mut self, project_root: &Path, scene: Scene) -> Self {
        self.scenes.insert(project_root.to_path_buf(), scene);
        self
    }

    pub fn watching_decls(mut self, decls: &Path) -> Self {
        self.watch_decls = Some(decls.to_path_buf());
        self
    }

    /// Makes scene construction dwell, widening the window in which the
    /// declaration artifact sits mutated.
    pub fn with_build_delay(mut self, delay: std::time::Duration) -> Self {
        self.build_delay = Some(delay);
        self
    }
}

#[async_trait]
impl SceneProvider for FixtureProvider {
    async fn build_scene(&self, config: &SceneBuildConfig) -> Result<Scene> {
        if let Some(delay) = self.build_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(decls) = &self.watch_decls {
            let content = std::fs::read_to_string(decls)?;
            self.observed_decls.lock().push(content);
        }
        match self.scenes.get(&config.project_root) {
            Some(scene) => Ok(scene.clone()),
            None => bail!("no scene for {}", config.project_root.display()),
        }
    }
}

/// Always fails to build a scene.
pub struct FailingProvider;

#[async_trait]
impl SceneProvider for FailingProvider {
    async fn build_scene(&self, _config: &SceneBuildConfig) -> Result<Scene> {
        bail!("scene construction blew up")
    }
}
