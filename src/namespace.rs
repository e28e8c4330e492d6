//! Namespace derivation from file paths and dependency ids.
//!
//! Unit paths are filesystem paths and are made relative to `baseUrl`.
//! Dependency ids are module ids that already live under `baseUrl`, so only
//! absolute dependency paths get relativized. Resolution is lexical: the
//! filesystem is never consulted.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use crate::options::TransformOptions;

/// Joins the unit namespace and a local name in a mangled root binding.
pub const MANGLE_SEPARATOR: &str = "$";

const EMPTY_SEGMENT: &str = "_";

lazy_static! {
    static ref SEPARATOR_RE: Regex = Regex::new(r"[/\\]+").unwrap();
    static ref DRIVE_RE: Regex = Regex::new(r"^[A-Za-z]:[/\\]").unwrap();
    static ref JS_EXT_RE: Regex = Regex::new(r"\.js$").unwrap();
}

/// Ordered, non-empty sequence of namespace segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    segments: Vec<String>,
}

impl Namespace {
    pub fn new(segments: Vec<String>) -> Self {
        if segments.is_empty() {
            return Namespace {
                segments: vec![EMPTY_SEGMENT.to_string()],
            };
        }
        Namespace { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    pub fn last(&self) -> &str {
        // non-empty by construction
        self.segments.last().map(|s| s.as_str()).unwrap_or(EMPTY_SEGMENT)
    }

    fn map_last(&self, f: impl FnOnce(&str) -> String) -> Namespace {
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            *last = f(last);
        }
        Namespace { segments }
    }

    pub fn with_suffix(&self, suffix: &str) -> Namespace {
        self.map_last(|last| format!("{}{}", last, suffix))
    }

    /// Namespaced home of a local top-level binding: `a.b` + `helper`
    /// becomes `a.b$helper`, a sibling of the unit's own export.
    pub fn mangle(&self, local: &str) -> Namespace {
        self.map_last(|last| format!("{}{}{}", last, MANGLE_SEPARATOR, local))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dotted())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PATH HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn is_absolute_path(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('\\') || DRIVE_RE.is_match(path)
}

/// Lexical normalization: drops `.` and empty segments, folds `..`.
fn normalize(path: &str) -> Vec<String> {
    let absolute = is_absolute_path(path);
    let mut out: Vec<String> = Vec::new();
    for seg in SEPARATOR_RE.split(path) {
        match seg {
            "" | "." => continue,
            ".." => match out.last() {
                Some(last) if last != ".." => {
                    out.pop();
                }
                // `..` above an absolute root stays at the root
                _ if absolute => {}
                _ => out.push("..".to_string()),
            },
            s => out.push(s.to_string()),
        }
    }
    out
}

/// `path.relative(base, target)` without touching the filesystem.
fn relative_segments(base: &str, target: &str) -> Vec<String> {
    let target_segments = normalize(target);
    if is_absolute_path(base) != is_absolute_path(target) {
        // no common root to relativize against
        return target_segments;
    }
    let base_segments = normalize(base);
    let common = base_segments
        .iter()
        .zip(&target_segments)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel: Vec<String> = base_segments[common..]
        .iter()
        .map(|_| "..".to_string())
        .collect();
    rel.extend(target_segments[common..].iter().cloned());
    rel
}

fn finish(mut segments: Vec<String>, options: &TransformOptions) -> Namespace {
    if let Some(last) = segments.last_mut() {
        *last = JS_EXT_RE.replace(last, "").to_string();
        if last.is_empty() {
            segments.pop();
        }
    }

    let foreign = segments
        .first()
        .map(|root| options.is_foreign(root))
        .unwrap_or(false);

    let mut result = if foreign {
        Vec::new()
    } else {
        options.namespace_segments()
    };
    result.extend(segments.into_iter().map(|s| s.replace('-', "_")));
    Namespace::new(result)
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Namespace of a dependency id as written in a `define` dependency array.
pub fn resolve_namespace(dependency: &str, options: &TransformOptions) -> Namespace {
    let segments = if is_absolute_path(dependency) {
        relative_segments(&options.base_url, dependency)
    } else {
        normalize(dependency)
    };
    finish(segments, options)
}

/// Namespace the unit itself provides, derived from its file path.
pub fn resolve_own_namespace(unit_path: &str, options: &TransformOptions) -> Namespace {
    let ns = finish(relative_segments(&options.base_url, unit_path), options);
    match options.own_suffix.as_deref() {
        Some(suffix) if !suffix.is_empty() => ns.with_suffix(suffix),
        _ => ns,
    }
}
