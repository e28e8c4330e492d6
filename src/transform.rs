//! Driver: parse a unit, find its `define(...)`, run the pipeline, print.
//!
//! Pipeline for a matched factory:
//!
//! 1. own namespace from the unit path (before any shape dispatch)
//! 2. shape classification of the first top-level `define(...)` statement
//! 3. dependency namespaces, root declarations, [`SubstitutionPlan`]
//! 4. [`IdentifierRewriter`] over the owned factory body
//! 5. [`ProgramAssembler`] builds the replacement statement list
//!
//! Anything that does not match leaves the unit byte-for-byte unchanged.

#[cfg(feature = "napi")]
use napi_derive::napi;
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use serde::{Deserialize, Serialize};

use crate::assembler::ProgramAssembler;
use crate::diagnostics::{
    Diagnostic, DiagnosticExport, TransformError, DIAG_COMMONJS_WRAPPER,
    DIAG_DISCARDED_STATEMENTS, DIAG_IGNORED_IDENTIFIER, DIAG_UNBOUND_PARAM,
    DIAG_UNRECOGNIZED_SHAPE,
};
use crate::namespace::{resolve_namespace, resolve_own_namespace, Namespace};
use crate::options::TransformOptions;
use crate::renamer::{IdentifierRewriter, SubstitutionPlan};
use crate::scope::collect_root_bindings;
use crate::shape::{
    as_define_statement, classify_define, factory_params, pair_dependencies, CallShape,
};

// ═══════════════════════════════════════════════════════════════════════════════
// RESULT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of [`transform_program`] on an already parsed program.
#[derive(Debug, Clone, Default)]
pub struct Transformation {
    pub transformed: bool,
    pub namespace: Option<Namespace>,
    pub requires: Vec<Namespace>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Transformation {
    fn unchanged(diagnostics: Vec<Diagnostic>) -> Self {
        Transformation {
            diagnostics,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResult {
    pub code: String,
    pub transformed: bool,
    pub namespace: Option<String>,
    pub requires: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TransformResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROGRAM TRANSFORMATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Rewrites `program` in place when its first top-level statement-level
/// `define(...)` call has an accepted shape. The program is left untouched
/// otherwise.
pub fn transform_program<'a>(
    allocator: &'a Allocator,
    program: &mut Program<'a>,
    unit_path: &str,
    options: &TransformOptions,
) -> Transformation {
    let own = resolve_own_namespace(unit_path, options);
    let mut diagnostics = Vec::new();

    let Some(index) = program
        .body
        .iter()
        .position(|stmt| as_define_statement(stmt).is_some())
    else {
        return Transformation::unchanged(diagnostics);
    };

    let shape = match as_define_statement(&program.body[index]) {
        Some(call) => classify_define(call),
        None => return Transformation::unchanged(diagnostics),
    };

    match &shape {
        CallShape::Unsupported { params } => {
            diagnostics.push(Diagnostic::error(
                DIAG_COMMONJS_WRAPPER,
                &format!(
                    "define(function (require, exports, module) {{...}}) is not supported ({} factory parameters without a dependency array)",
                    params
                ),
                unit_path,
            ));
            return Transformation::unchanged(diagnostics);
        }
        CallShape::Unrecognized => {
            diagnostics.push(Diagnostic::warning(
                DIAG_UNRECOGNIZED_SHAPE,
                "top-level define() call has an unrecognized argument shape",
                unit_path,
            ));
            return Transformation::unchanged(diagnostics);
        }
        CallShape::IdentifiedArrayDepsFactory { identifier, .. } => {
            diagnostics.push(Diagnostic::warning(
                DIAG_IGNORED_IDENTIFIER,
                &format!("ignoring manually specified \"{}\" identifier", identifier),
                unit_path,
            ));
        }
        _ => {}
    }

    let discarded = program.body.len() - 1;
    if discarded > 0 {
        diagnostics.push(Diagnostic::warning(
            DIAG_DISCARDED_STATEMENTS,
            &format!("{} top-level statement(s) outside define() were dropped", discarded),
            unit_path,
        ));
    }

    let define_span = program.body[index].span();
    let payload = match &mut program.body[index] {
        Statement::ExpressionStatement(stmt) => match &mut stmt.expression {
            Expression::CallExpression(call) => call.arguments.pop(),
            _ => None,
        },
        _ => None,
    };

    let assembler = ProgramAssembler::new(allocator, &options.target_object);
    let ast = assembler.ast;
    let dependencies: Vec<Namespace> = shape
        .dependencies()
        .iter()
        .map(|dep| resolve_namespace(dep, options))
        .collect();

    let body = match payload {
        Some(Argument::FunctionExpression(mut factory)) if shape.has_factory() => {
            let params = factory_params(&factory);
            if params.len() > dependencies.len() {
                diagnostics.push(Diagnostic::warning(
                    DIAG_UNBOUND_PARAM,
                    &format!(
                        "factory declares {} parameters for {} dependencies",
                        params.len(),
                        dependencies.len()
                    ),
                    unit_path,
                ));
            }
            let specs = pair_dependencies(shape.dependencies(), &params);

            let (mut statements, directives) = match factory.body.as_mut() {
                Some(body) => (
                    std::mem::replace(&mut body.statements, ast.vec()),
                    std::mem::replace(&mut body.directives, ast.vec()),
                ),
                None => (ast.vec(), ast.vec()),
            };

            let root_names = collect_root_bindings(&statements);
            let plan = SubstitutionPlan::build(&specs, &dependencies, &root_names, &own);
            let mut rewriter = IdentifierRewriter::new(allocator, &plan);
            rewriter.rewrite_statements(&mut statements);
            log::debug!(
                "{}: {} identifier rewrites, {} root bindings",
                unit_path,
                rewriter.rewrites,
                root_names.len()
            );

            for directive in directives {
                program.directives.push(directive);
            }
            assembler.assemble_factory(define_span, &own, &dependencies, statements)
        }
        Some(Argument::ObjectExpression(object)) => {
            assembler.assemble_object(define_span, &own, Expression::ObjectExpression(object))
        }
        _ => return Transformation::unchanged(diagnostics),
    };

    program.body = body;
    log::debug!("{}: provided as {}", unit_path, own);

    Transformation {
        transformed: true,
        namespace: Some(own),
        requires: dependencies,
        diagnostics,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE TRANSFORMATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Transforms one unit of source text.
///
/// Parse failures are hard errors. Every other outcome, including an
/// unsupported or missing `define`, yields a result; check
/// [`TransformResult::transformed`] and the diagnostics.
pub fn transform(
    unit_path: &str,
    source: &str,
    options: &TransformOptions,
) -> Result<TransformResult, TransformError> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(false);
    let ret = Parser::new(&allocator, source, source_type).parse();

    if ret.panicked || !ret.errors.is_empty() {
        return Err(TransformError::Parse {
            file: unit_path.to_string(),
            messages: ret.errors.iter().map(|e| e.to_string()).collect(),
        });
    }

    let mut program = ret.program;
    let outcome = transform_program(&allocator, &mut program, unit_path, options);

    if !outcome.transformed {
        return Ok(TransformResult {
            code: source.to_string(),
            transformed: false,
            namespace: None,
            requires: Vec::new(),
            diagnostics: outcome.diagnostics,
        });
    }

    if !options.format {
        program.comments = AstBuilder::new(&allocator).vec();
    }

    let code = Codegen::new()
        .with_options(CodegenOptions {
            single_quote: true,
            ..CodegenOptions::default()
        })
        .build(&program)
        .code;

    Ok(TransformResult {
        code: code.trim_end().to_string(),
        transformed: true,
        namespace: outcome.namespace.map(|ns| ns.dotted()),
        requires: outcome.requires.iter().map(Namespace::dotted).collect(),
        diagnostics: outcome.diagnostics,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE BINDING
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "napi", napi(object))]
pub struct TransformOutput {
    pub code: String,
    pub transformed: bool,
    pub namespace: Option<String>,
    pub requires: Vec<String>,
    pub diagnostics: Vec<DiagnosticExport>,
}

impl From<TransformResult> for TransformOutput {
    fn from(result: TransformResult) -> Self {
        TransformOutput {
            diagnostics: result.diagnostics.iter().map(DiagnosticExport::from).collect(),
            code: result.code,
            transformed: result.transformed,
            namespace: result.namespace,
            requires: result.requires,
        }
    }
}

#[cfg(feature = "napi")]
#[napi]
pub fn transform_amd_native(
    file: String,
    source: String,
    options_json: Option<String>,
) -> napi::Result<TransformOutput> {
    let options = match options_json {
        Some(json) => TransformOptions::from_json(&json)
            .map_err(|e| napi::Error::from_reason(e.to_string()))?,
        None => TransformOptions::default(),
    };
    let options = options.anchored_to_cwd(&file);
    let result = transform(&file, &source, &options)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    Ok(TransformOutput::from(result))
}
