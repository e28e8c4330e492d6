use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::diagnostics::TransformError;
use crate::namespace::is_absolute_path;

pub const DEFAULT_BASE_URL: &str = ".";
pub const DEFAULT_TARGET_OBJECT: &str = "goog";

/// Path-mapping and output options for a single transformation.
///
/// Field names follow the camelCase keys accepted by the JavaScript tooling
/// (`baseUrl`, `foreignLibs`, ...) so a JSON config can be shared with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    /// Root against which unit and dependency paths become namespaces.
    pub base_url: String,
    /// Dotted global prefix for every locally resolved namespace.
    pub namespace: Option<String>,
    /// First path segments exempt from the global prefix.
    pub foreign_libs: Vec<String>,
    /// Keep comments in the printed output.
    pub format: bool,
    /// Object carrying `provide`/`require` in the emitted code.
    pub target_object: String,
    /// Appended to the final segment of the unit's own namespace.
    pub own_suffix: Option<String>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            base_url: DEFAULT_BASE_URL.to_string(),
            namespace: None,
            foreign_libs: Vec::new(),
            format: true,
            target_object: DEFAULT_TARGET_OBJECT.to_string(),
            own_suffix: None,
        }
    }
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, TransformError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, TransformError> {
        let data = fs::read_to_string(path)
            .map_err(|e| TransformError::io(path.display().to_string(), e))?;
        Self::from_json(&data)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_foreign_libs(mut self, libs: Vec<String>) -> Self {
        self.foreign_libs = libs;
        self
    }

    pub fn with_format(mut self, format: bool) -> Self {
        self.format = format;
        self
    }

    pub fn with_target_object(mut self, target: impl Into<String>) -> Self {
        self.target_object = target.into();
        self
    }

    pub fn with_own_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.own_suffix = Some(suffix.into());
        self
    }

    /// Segments of the global namespace prefix, empty when none is set.
    pub fn namespace_segments(&self) -> Vec<String> {
        self.namespace
            .as_deref()
            .map(|ns| {
                ns.split('.')
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_foreign(&self, root: &str) -> bool {
        self.foreign_libs.iter().any(|lib| lib == root)
    }

    /// Options for an absolute `unit_path`: a relative `base_url` is joined
    /// onto `cwd` so both sides of the relativization share a root.
    pub fn anchored(&self, unit_path: &str, cwd: &Path) -> TransformOptions {
        let mut options = self.clone();
        if is_absolute_path(unit_path) && !is_absolute_path(&self.base_url) {
            options.base_url = cwd.join(&self.base_url).to_string_lossy().into_owned();
        }
        options
    }

    /// [`TransformOptions::anchored`] against the process working directory.
    pub fn anchored_to_cwd(&self, unit_path: &str) -> TransformOptions {
        match std::env::current_dir() {
            Ok(cwd) => self.anchored(unit_path, &cwd),
            Err(e) => {
                log::warn!("cannot read working directory, keeping baseUrl {}: {}", self.base_url, e);
                self.clone()
            }
        }
    }
}
