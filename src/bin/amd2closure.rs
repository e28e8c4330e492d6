//! `amd2closure`: rewrite AMD `define()` units into Closure namespaces.
//!
//! ```text
//! amd2closure src/app --base-url src --namespace myapp --out-dir build
//! amd2closure src/app/main.js --base-url src
//! ```
//!
//! Single files print to stdout unless `--out-dir` is given. Exits non-zero
//! when any unit fails to parse or cannot be read or written.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use amd_closure_native::{
    transform_directory, transform_file, IncrementalCache, TransformOptions, TransformResult,
    DEFAULT_CACHE_DIR,
};
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "amd2closure",
    about = "Rewrite AMD define() modules into goog.provide/goog.require namespaces"
)]
struct Cli {
    /// Files or directories to transform.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory namespaces are derived relative to.
    #[arg(long)]
    base_url: Option<String>,

    /// Dotted prefix applied to every local namespace.
    #[arg(long)]
    namespace: Option<String>,

    /// Path root exempt from the namespace prefix (repeatable).
    #[arg(long = "foreign-lib")]
    foreign_libs: Vec<String>,

    /// Drop comments from the output.
    #[arg(long)]
    no_format: bool,

    /// Object carrying provide/require (default: goog).
    #[arg(long)]
    target_object: Option<String>,

    /// Suffix appended to each unit's own namespace.
    #[arg(long)]
    own_suffix: Option<String>,

    /// JSON options file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write transformed units here instead of stdout.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Reuse results from the on-disk cache.
    #[arg(long)]
    cache: bool,
}

impl Cli {
    fn options(&self) -> Result<TransformOptions> {
        let mut options = match &self.config {
            Some(path) => TransformOptions::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => TransformOptions::default(),
        };
        if let Some(base_url) = &self.base_url {
            options.base_url = base_url.clone();
        }
        if let Some(namespace) = &self.namespace {
            options.namespace = Some(namespace.clone());
        }
        if !self.foreign_libs.is_empty() {
            options.foreign_libs = self.foreign_libs.clone();
        }
        if self.no_format {
            options.format = false;
        }
        if let Some(target) = &self.target_object {
            options.target_object = target.clone();
        }
        if let Some(suffix) = &self.own_suffix {
            options.own_suffix = Some(suffix.clone());
        }
        Ok(options)
    }
}

fn emit(path: &Path, result: &TransformResult, out: Option<&Path>) -> Result<()> {
    for diagnostic in &result.diagnostics {
        diagnostic.emit();
    }
    match out {
        Some(target) => {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(target, format!("{}\n", result.code))
                .with_context(|| format!("writing {}", target.display()))?;
            log::info!("{} -> {}", path.display(), target.display());
        }
        None => println!("{}", result.code),
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<bool> {
    let options = cli.options()?;
    let cache = cli.cache.then(|| IncrementalCache::new(DEFAULT_CACHE_DIR));
    let mut ok = true;

    for input in &cli.inputs {
        if input.is_dir() {
            for outcome in transform_directory(input, &options, cache.as_ref()) {
                let target = cli.out_dir.as_ref().map(|dir| {
                    dir.join(outcome.path.strip_prefix(input).unwrap_or(&outcome.path))
                });
                match outcome.result {
                    Ok(result) => emit(&outcome.path, &result, target.as_deref())?,
                    Err(e) => {
                        log::error!("{}", e);
                        ok = false;
                    }
                }
            }
        } else {
            let target = match (&cli.out_dir, input.file_name()) {
                (Some(dir), Some(name)) => Some(dir.join(name)),
                _ => None,
            };
            match transform_file(input, &options, cache.as_ref()) {
                Ok(result) => emit(input, &result, target.as_deref())?,
                Err(e) => {
                    log::error!("{}", e);
                    ok = false;
                }
            }
        }
    }
    Ok(ok)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if !run(&cli)? {
        process::exit(1);
    }
    Ok(())
}
