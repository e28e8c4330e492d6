use oxc_ast::ast::*;
use serde::{Deserialize, Serialize};

pub const DEFINE_CALLEE: &str = "define";

// ═══════════════════════════════════════════════════════════════════════════════
// CALL SHAPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Accepted `define(...)` forms, plus the two ways a call can fail to match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CallShape {
    /// `define(function () {...})`
    NoDepsFactory,
    /// `define({...})`
    ObjectLiteral,
    /// `define([...], function (...) {...})`
    ArrayDepsFactory { dependencies: Vec<String> },
    /// `define("id", [...], function (...) {...})`
    IdentifiedArrayDepsFactory {
        identifier: String,
        dependencies: Vec<String>,
    },
    /// `define(function (require, exports, module) {...})`
    Unsupported { params: usize },
    Unrecognized,
}

impl CallShape {
    pub fn dependencies(&self) -> &[String] {
        match self {
            CallShape::ArrayDepsFactory { dependencies }
            | CallShape::IdentifiedArrayDepsFactory { dependencies, .. } => dependencies,
            _ => &[],
        }
    }

    pub fn has_factory(&self) -> bool {
        matches!(
            self,
            CallShape::NoDepsFactory
                | CallShape::ArrayDepsFactory { .. }
                | CallShape::IdentifiedArrayDepsFactory { .. }
        )
    }
}

/// One entry of the dependency array with the factory parameter bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub path: String,
    pub param: Option<String>,
}

/// Pairs dependency ids with factory parameter names by position.
/// Missing parameters leave the dependency unbound.
pub fn pair_dependencies(dependencies: &[String], params: &[Option<String>]) -> Vec<DependencySpec> {
    dependencies
        .iter()
        .enumerate()
        .map(|(i, path)| DependencySpec {
            path: path.clone(),
            param: params.get(i).cloned().flatten(),
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASSIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

pub fn is_define_call(call: &CallExpression) -> bool {
    matches!(&call.callee, Expression::Identifier(ident) if ident.name == DEFINE_CALLEE)
}

/// Returns the `define(...)` call when the statement is exactly
/// `define(...);` at statement level.
pub fn as_define_statement<'s, 'a>(stmt: &'s Statement<'a>) -> Option<&'s CallExpression<'a>> {
    if let Statement::ExpressionStatement(expr_stmt) = stmt {
        if let Expression::CallExpression(call) = &expr_stmt.expression {
            if is_define_call(call) {
                return Some(call);
            }
        }
    }
    None
}

/// Parameter names of a factory, `None` for destructured parameters.
pub fn factory_params(func: &Function) -> Vec<Option<String>> {
    func.params
        .items
        .iter()
        .map(|param| match &param.pattern {
            BindingPattern::BindingIdentifier(id) => Some(id.name.to_string()),
            _ => None,
        })
        .collect()
}

fn param_count(func: &Function) -> usize {
    func.params.items.len() + usize::from(func.params.rest.is_some())
}

fn dependency_ids(array: &ArrayExpression) -> Option<Vec<String>> {
    array
        .elements
        .iter()
        .map(|el| match el {
            ArrayExpressionElement::StringLiteral(s) => Some(s.value.to_string()),
            ArrayExpressionElement::TemplateLiteral(t)
                if t.expressions.is_empty() && t.quasis.len() == 1 =>
            {
                Some(t.quasis[0].value.raw.to_string())
            }
            _ => None,
        })
        .collect()
}

/// First matching rule wins; the order mirrors the accepted forms table.
pub fn classify_define(call: &CallExpression) -> CallShape {
    match call.arguments.as_slice() {
        [Argument::FunctionExpression(factory)] => {
            let params = param_count(factory);
            if params == 0 {
                CallShape::NoDepsFactory
            } else {
                CallShape::Unsupported { params }
            }
        }
        [Argument::ObjectExpression(_)] => CallShape::ObjectLiteral,
        [Argument::ArrayExpression(deps), Argument::FunctionExpression(_)] => {
            match dependency_ids(deps) {
                Some(dependencies) => CallShape::ArrayDepsFactory { dependencies },
                None => CallShape::Unrecognized,
            }
        }
        [Argument::StringLiteral(id), Argument::ArrayExpression(deps), Argument::FunctionExpression(_)] => {
            match dependency_ids(deps) {
                Some(dependencies) => CallShape::IdentifiedArrayDepsFactory {
                    identifier: id.value.to_string(),
                    dependencies,
                },
                None => CallShape::Unrecognized,
            }
        }
        _ => CallShape::Unrecognized,
    }
}
