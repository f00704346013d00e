//! Program-scene data model and the analysis-engine interface.
//!
//! The collector does not parse or type-check source itself. An external
//! analysis engine builds the program scene (classes, methods, control-flow
//! graphs, resolved call signatures) and hands it over through the
//! [`SceneProvider`] trait. Everything in this module is the *consumed*
//! shape of that collaboration; the engine's own algorithms are out of
//! scope.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Class name the engine assigns to top-level code that belongs to no
/// explicit class.
pub const DEFAULT_CLASS_SENTINEL: &str = "_DEFAULT_CLASS";

/// Method name the engine assigns to its synthetic placeholder method.
pub const DEFAULT_METHOD_SENTINEL: &str = "_DEFAULT_METHOD";

/// Package name used when no declaring file can be resolved at all.
pub const UNKNOWN_PACKAGE: &str = "unknown";

/// Everything the engine resolved for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub project_name: String,
    /// Absolute project directory the engine scanned; file identifiers are
    /// relative to it.
    pub real_project_dir: String,
    pub files: Vec<SceneFile>,
}

impl Scene {
    /// Looks up a file by its project-relative identifier.
    pub fn file(&self, name: &str) -> Option<&SceneFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Converts an absolute source path into the engine's file identifier.
    pub fn file_identifier(&self, source_path: &Path) -> String {
        let path = source_path.to_string_lossy();
        let prefix = format!("{}/", self.real_project_dir.trim_end_matches('/'));
        path.strip_prefix(prefix.as_str())
            .unwrap_or(path.as_ref())
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    /// Project-relative identifier, e.g. `src/main/ets/pages/Index.ets`.
    pub name: String,
    /// Absolute path on disk.
    pub path: String,
    /// Classes in declaration order, synthetic default class included.
    pub classes: Vec<SceneClass>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneClass {
    pub name: String,
    /// Methods in declaration order.
    pub methods: Vec<SceneMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMethod {
    pub name: String,
    /// Absent for abstract and ambient declarations: no executable body,
    /// nothing to walk.
    pub cfg: Option<ControlFlowGraph>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlFlowGraph {
    /// Statements in control-flow order.
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    Invoke(InvokeStmt),
    /// Any non-invocation statement; carried so control-flow order survives
    /// serialization, ignored by recognition.
    Other,
}

impl Stmt {
    pub fn as_invocation(&self) -> Option<&InvokeStmt> {
        match self {
            Stmt::Invoke(stmt) => Some(stmt),
            Stmt::Other => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeStmt {
    pub callee: MethodSignature,
    pub position: LineColPosition,
}

/// Externally-resolved identity of a called method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodSignature {
    pub declaring_class: ClassSignature,
    pub sub_signature: MethodSubSignature,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSignature {
    pub class_name: String,
    /// Name of the file declaring the class, when the engine resolved one.
    pub declaring_file: Option<String>,
    pub declaring_namespace: Option<NamespaceSignature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceSignature {
    pub namespace_name: String,
    pub declaring_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodSubSignature {
    pub method_name: String,
    /// Canonical declaration text, terminators and all, e.g.
    /// `getVolume(callback: AsyncCallback<number>): void;`.
    pub raw_text: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineColPosition {
    pub line: u32,
    pub col: u32,
}

/// What a session hands the engine when asking for a scene.
#[derive(Debug, Clone)]
pub struct SceneBuildConfig {
    pub project_root: PathBuf,
    pub sdk_root: PathBuf,
    pub extra_lib: Option<PathBuf>,
}

/// The analysis engine, seen from the collector's side.
#[async_trait]
pub trait SceneProvider: Send + Sync {
    async fn build_scene(&self, config: &SceneBuildConfig) -> Result<Scene>;
}

/// Loads a scene the engine serialized to `<project>/scene.json`.
///
/// The production engine runs out of process and leaves its resolved scene
/// next to the project sources; this provider is the deserializing half of
/// that handshake.
#[derive(Debug, Default)]
pub struct JsonSceneProvider;

impl JsonSceneProvider {
    pub const SCENE_FILE: &'static str = "scene.json";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SceneProvider for JsonSceneProvider {
    async fn build_scene(&self, config: &SceneBuildConfig) -> Result<Scene> {
        let scene_path = config.project_root.join(Self::SCENE_FILE);
        let raw = tokio::fs::read_to_string(&scene_path)
            .await
            .with_context(|| format!("no serialized scene at {}", scene_path.display()))?;
        let scene: Scene = serde_json::from_str(&raw)
            .with_context(|| format!("malformed scene in {}", scene_path.display()))?;
        Ok(scene)
    }
}
