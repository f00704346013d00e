//! Call-site recognition over a built program scene.
//!
//! The recognizer walks every class, method, and control-flow statement of a
//! scene file, resolves each invocation to an [`ApiFinding`], and suppresses
//! repeats through a seen-set keyed by [`RecordKey`]. The seen-set lives
//! exactly as long as the recognizer instance, i.e. one project's scan:
//! deduplication is per-project here, and per-artifact in the sinks.

use crate::model::{ApiFinding, RecordKey};
use crate::scene::{
    InvokeStmt, Scene, SceneClass, SceneFile, SceneMethod, DEFAULT_CLASS_SENTINEL,
    DEFAULT_METHOD_SENTINEL, UNKNOWN_PACKAGE,
};
use std::collections::HashSet;
use std::path::Path;

#[derive(Default)]
pub struct CallSiteRecognizer {
    findings: Vec<ApiFinding>,
    seen: HashSet<RecordKey>,
}

impl CallSiteRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognizes every invocation reachable in one source file. A file the
    /// engine did not build is skipped, not an error.
    pub fn recognize(&mut self, scene: &Scene, source_path: &Path) {
        let identifier = scene.file_identifier(source_path);
        let Some(file) = scene.file(&identifier) else {
            return;
        };
        for class in &file.classes {
            self.recognize_class(file, class);
        }
    }

    fn recognize_class(&mut self, file: &SceneFile, class: &SceneClass) {
        for method in &class.methods {
            self.recognize_method(file, method);
        }
    }

    fn recognize_method(&mut self, file: &SceneFile, method: &SceneMethod) {
        if method.name == DEFAULT_METHOD_SENTINEL {
            return;
        }
        // No CFG means no executable body (abstract or ambient declaration).
        let Some(cfg) = &method.cfg else {
            return;
        };
        for stmt in &cfg.stmts {
            if let Some(invoke) = stmt.as_invocation() {
                self.recognize_invocation(file, invoke);
            }
        }
    }

    fn recognize_invocation(&mut self, file: &SceneFile, invoke: &InvokeStmt) {
        let class_signature = &invoke.callee.declaring_class;
        let sub_signature = &invoke.callee.sub_signature;

        let mut finding = ApiFinding::new();

        let package_name = class_signature
            .declaring_file
            .clone()
            .or_else(|| {
                class_signature
                    .declaring_namespace
                    .as_ref()
                    .and_then(|ns| ns.declaring_file.clone())
            })
            .unwrap_or_else(|| UNKNOWN_PACKAGE.to_string());
        finding.set_package_name(&package_name);

        let mut class_name = class_signature.class_name.as_str();
        if class_name == DEFAULT_CLASS_SENTINEL {
            if let Some(ns) = &class_signature.declaring_namespace {
                class_name = ns.namespace_name.as_str();
            }
        }
        finding.set_type_name(class_name);

        finding.set_property_name(&sub_signature.method_name);
        finding.set_api_raw_text(&sub_signature.raw_text);
        finding.set_source_file_name(&file.path);
        finding.set_position(&invoke.position);

        self.record(finding);
    }

    /// Appends a finding unless an identical one was already recorded during
    /// this recognizer's lifetime.
    fn record(&mut self, finding: ApiFinding) {
        let key = finding.record_key();
        if self.seen.contains(&key) {
            return;
        }
        self.findings.push(finding);
        self.seen.insert(key);
    }

    /// Findings in traversal order, duplicates removed by first occurrence.
    pub fn findings(&self) -> &[ApiFinding] {
        &self.findings
    }

    pub fn into_findings(self) -> Vec<ApiFinding> {
        self.findings
    }
}
