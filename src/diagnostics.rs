#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const DIAG_COMMONJS_WRAPPER: &str = "AMD-E-COMMONJS";
pub const DIAG_IGNORED_IDENTIFIER: &str = "AMD-W-IGNORED-ID";
pub const DIAG_UNRECOGNIZED_SHAPE: &str = "AMD-W-UNRECOGNIZED";
pub const DIAG_DISCARDED_STATEMENTS: &str = "AMD-W-DISCARDED";
pub const DIAG_UNBOUND_PARAM: &str = "AMD-W-UNBOUND-PARAM";

fn get_hint(code: &str) -> &'static str {
    match code {
        DIAG_COMMONJS_WRAPPER => {
            "Rewrite the module as define([...deps], function (...) {...}); the unit was left untouched."
        }
        DIAG_IGNORED_IDENTIFIER => "Module namespaces are always derived from the file path.",
        DIAG_UNRECOGNIZED_SHAPE => {
            "Accepted forms: define(fn), define({...}), define([...], fn), define('id', [...], fn)."
        }
        DIAG_DISCARDED_STATEMENTS => {
            "Only the define() call contributes to the output; move other code inside the factory."
        }
        DIAG_UNBOUND_PARAM => "Factory parameters without a matching dependency are left as-is.",
        _ => "",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Advisory message attached to a transformed (or passed-through) unit.
///
/// Diagnostics never abort a batch; at worst the unit is left unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub file: String,
    pub hint: String,
}

impl Diagnostic {
    pub fn warning(code: &str, message: &str, file: &str) -> Self {
        Self::new(code, Severity::Warning, message, file)
    }

    pub fn error(code: &str, message: &str, file: &str) -> Self {
        Self::new(code, Severity::Error, message, file)
    }

    fn new(code: &str, severity: Severity, message: &str, file: &str) -> Self {
        Diagnostic {
            code: code.to_string(),
            severity,
            message: message.to_string(),
            file: file.to_string(),
            hint: get_hint(code).to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Forwards the diagnostic to the `log` facade at the matching level.
    pub fn emit(&self) {
        match self.severity {
            Severity::Warning => log::warn!("[{}] {} ({})", self.code, self.message, self.file),
            Severity::Error => log::error!("[{}] {} ({})", self.code, self.message, self.file),
        }
    }
}

/// Flat form of a diagnostic for the Node binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
pub struct DiagnosticExport {
    pub code: String,
    pub severity: String,
    pub message: String,
    pub file: String,
    pub hint: String,
}

impl From<&Diagnostic> for DiagnosticExport {
    fn from(d: &Diagnostic) -> Self {
        DiagnosticExport {
            code: d.code.clone(),
            severity: match d.severity {
                Severity::Warning => "warning".to_string(),
                Severity::Error => "error".to_string(),
            },
            message: d.message.clone(),
            file: d.file.clone(),
            hint: d.hint.clone(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HARD FAILURES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to parse {file}: {}", messages.join("; "))]
    Parse { file: String, messages: Vec<String> },

    #[error("invalid transform options: {0}")]
    Options(#[from] serde_json::Error),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl TransformError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        TransformError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_follows_code() {
        let d = Diagnostic::error(DIAG_COMMONJS_WRAPPER, "unsupported", "a.js");
        assert!(d.is_error());
        assert!(d.hint.contains("define([...deps]"));

        let w = Diagnostic::warning("SOMETHING-ELSE", "x", "a.js");
        assert!(!w.is_error());
        assert!(w.hint.is_empty());
    }

    #[test]
    fn test_parse_error_message_lists_all_errors() {
        let err = TransformError::Parse {
            file: "a.js".to_string(),
            messages: vec!["first".to_string(), "second".to_string()],
        };
        assert_eq!(err.to_string(), "failed to parse a.js: first; second");
    }

    #[test]
    fn test_export_lowercases_severity() {
        let d = Diagnostic::warning(DIAG_IGNORED_IDENTIFIER, "ignored", "a.js");
        let export = DiagnosticExport::from(&d);
        assert_eq!(export.severity, "warning");
        assert_eq!(export.code, "AMD-W-IGNORED-ID");
    }
}
