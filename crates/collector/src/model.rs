//! Finding data model and deduplication identity.
//!
//! An [`ApiFinding`] describes one resolved use of a declared API at one call
//! site. The recognizer builds findings incrementally through the setters
//! here; enrichment layers fill in the optional metadata afterwards. Once a
//! finding has been handed to a sink it is owned by the sink and never
//! mutated again.

use crate::scene::LineColPosition;
use serde::{Deserialize, Serialize};

/// One observed use of a declared API at one call site.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiFinding {
    /// Name of the SDK declaration file the symbol originates from. The core
    /// recognizer never sets this; see [`RecordKey`] for the consequence.
    pub decl_file_name: String,

    /// Module/file the declaring class belongs to, or "unknown".
    pub package_name: String,

    /// Declaring class name (namespace name for synthetic default classes).
    pub type_name: String,

    /// Called method's simple name.
    pub property_name: String,

    /// Canonical textual signature of the declaration, terminators stripped.
    pub api_raw_text: String,

    /// Absolute path of the file containing the call site.
    pub source_file_name: String,

    /// Call-site position serialized as `"line,col"`.
    pub position: String,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub qualified_type_name: String,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub deprecated_since: String,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub qualified_name: String,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub use_instead: String,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub component_name: String,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub api_type: String,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub decl_path: String,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub api_text: String,
}

impl ApiFinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_decl_file_name(&mut self, file_name: &str) {
        self.decl_file_name = file_name.to_string();
    }

    /// Last write wins: enrichment may re-resolve the package later and its
    /// answer always replaces the recognizer's. Asymmetric with
    /// [`set_type_name`](Self::set_type_name) on purpose.
    pub fn set_package_name(&mut self, package_name: &str) {
        self.package_name = package_name.to_string();
    }

    /// First write wins: an empty or repeated value never clobbers a type
    /// name that has already been resolved.
    pub fn set_type_name(&mut self, type_name: &str) {
        if !type_name.is_empty() && self.type_name.is_empty() {
            self.type_name = type_name.to_string();
        }
    }

    /// Builds a dotted path outside-in: each call prefixes a new enclosing
    /// segment, so `set("Inner")` then `set("Outer")` yields `Outer.Inner`.
    pub fn set_qualified_type_name(&mut self, type_name: &str) {
        if self.qualified_type_name.is_empty() {
            self.qualified_type_name = type_name.to_string();
        } else {
            self.qualified_type_name = format!("{}.{}", type_name, self.qualified_type_name);
        }
    }

    pub fn set_property_name(&mut self, property_name: &str) {
        self.property_name = property_name.to_string();
    }

    /// Stores the raw declaration text with every statement terminator
    /// removed, so `foo(x: number): void;` becomes `foo(x: number): void`.
    pub fn set_api_raw_text(&mut self, api_raw_text: &str) {
        self.api_raw_text = api_raw_text.replace(';', "");
    }

    pub fn set_source_file_name(&mut self, source_file_name: &str) {
        self.source_file_name = source_file_name.to_string();
    }

    pub fn set_position(&mut self, pos: &LineColPosition) {
        self.position = format!("{},{}", pos.line, pos.col);
    }

    /// Extracts the version number from a `since N` deprecation annotation.
    /// Anything without that shape is ignored.
    pub fn set_deprecated_since(&mut self, annotation: &str) {
        if let Some(rest) = annotation.trim_start().strip_prefix("since") {
            let digits: String = rest
                .trim_start()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if !digits.is_empty() {
                self.deprecated_since = digits;
            }
        }
    }

    pub fn set_qualified_name(&mut self, qualified_name: &str) {
        self.qualified_name = qualified_name.to_string();
    }

    pub fn set_use_instead(&mut self, use_instead: &str) {
        self.use_instead = use_instead.to_string();
    }

    pub fn set_component_name(&mut self, component_name: &str) {
        self.component_name = component_name.to_string();
    }

    pub fn set_api_type(&mut self, api_type: &str) {
        self.api_type = api_type.to_string();
    }

    pub fn set_decl_path(&mut self, decl_path: &str) {
        self.decl_path = decl_path.to_string();
    }

    pub fn set_completed_text(&mut self, completed_text: &str) {
        self.api_text = completed_text.to_string();
    }

    pub fn record_key(&self) -> RecordKey {
        RecordKey::of(self)
    }
}

/// Deduplication identity of a finding.
///
/// Two findings with equal keys are the same finding. The key keeps the
/// declaration-file segment even though the recognizer never fills it in
/// (it is empty for every core-produced finding); downstream consumers rely
/// on the exact key shape, so the segment stays.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(String);

const KEY_SEPARATOR: &str = "#";

impl RecordKey {
    pub fn of(finding: &ApiFinding) -> Self {
        let segments = [
            finding.decl_file_name.as_str(),
            finding.type_name.as_str(),
            finding.api_raw_text.as_str(),
            finding.source_file_name.as_str(),
            finding.position.as_str(),
        ];
        Self(segments.join(KEY_SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
