//! # AMD → Closure namespace transformer
//!
//! Rewrites an AMD `define(...)` unit into Closure Library form:
//!
//! ```text
//! define(["bs", "as"], function (b, a) { return b + a; });
//! ```
//!
//! becomes, for a unit at `ns.js`,
//!
//! ```text
//! goog.provide('ns');
//! goog.require('bs');
//! goog.require('as');
//! ns = bs + as;
//! ```
//!
//! ## Rewriting Invariants
//!
//! 1. **Own namespace first**: the unit namespace is derived from its path
//!    before the `define` shape is inspected.
//! 2. **Single definition**: only the first `define(...)` that is itself a
//!    top-level expression statement counts. Everything else passes through.
//! 3. **Parameter priority**: a dependency parameter always wins over a root
//!    declaration of the same name.
//! 4. **Shadowing**: names bound by nested functions or catch clauses are
//!    never substituted.
//! 5. **Positions**: object keys and member property names are never
//!    substituted; `{ foo }` expands to `{ foo: <ns> }`.
//! 6. **Pass-through**: an untransformed unit is returned byte-for-byte.

mod assembler;
mod cache;
mod diagnostics;
mod discovery;
mod namespace;
mod options;
mod renamer;
mod scope;
mod shape;
mod transform;

#[cfg(test)]
mod transform_tests;

pub use assembler::{namespace_expression, ProgramAssembler};
pub use cache::{IncrementalCache, DEFAULT_CACHE_DIR};
pub use diagnostics::*;
pub use discovery::{find_js_files, transform_directory, transform_file, UnitOutcome};
pub use namespace::{resolve_namespace, resolve_own_namespace, Namespace, MANGLE_SEPARATOR};
pub use options::{TransformOptions, DEFAULT_BASE_URL, DEFAULT_TARGET_OBJECT};
pub use renamer::{IdentifierRewriter, SubstitutionPlan};
pub use scope::{collect_root_bindings, ScopeCollector};
pub use shape::{classify_define, CallShape, DependencySpec};
pub use transform::{transform, transform_program, TransformOutput, TransformResult, Transformation};

#[cfg(feature = "napi")]
pub use transform::transform_amd_native;
