//! Batch discovery: every `.js` unit under a directory, transformed in
//! parallel with one allocator per unit.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cache::IncrementalCache;
use crate::diagnostics::TransformError;
use crate::options::TransformOptions;
use crate::transform::{transform, TransformResult};

pub const UNIT_EXTENSION: &str = "js";

/// Per-unit result of a batch run. A failed unit never aborts the batch.
#[derive(Debug)]
pub struct UnitOutcome {
    pub path: PathBuf,
    pub result: Result<TransformResult, TransformError>,
}

/// Recursively find all `.js` files in a directory, in path order.
pub fn find_js_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("skipping unreadable entry under {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| ext == UNIT_EXTENSION)
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Reads and transforms one unit, consulting the cache when given.
pub fn transform_file(
    path: &Path,
    options: &TransformOptions,
    cache: Option<&IncrementalCache>,
) -> Result<TransformResult, TransformError> {
    let path_str = path.to_string_lossy().to_string();
    let options = &options.anchored_to_cwd(&path_str);
    let source =
        fs::read_to_string(path).map_err(|e| TransformError::io(path_str.clone(), e))?;

    if let Some(hit) = cache.and_then(|c| c.get(&path_str, &source, options)) {
        return Ok(hit);
    }

    let result = transform(&path_str, &source, options)?;
    if let Some(cache) = cache {
        cache.set(&path_str, &source, options, &result);
    }
    Ok(result)
}

pub fn transform_directory(
    dir: &Path,
    options: &TransformOptions,
    cache: Option<&IncrementalCache>,
) -> Vec<UnitOutcome> {
    let files = find_js_files(dir);
    log::debug!("discovered {} units under {}", files.len(), dir.display());

    files
        .into_par_iter()
        .map(|path| {
            let result = transform_file(&path, options, cache);
            UnitOutcome { path, result }
        })
        .collect()
}
