//! Synthesis of the replacement program: `provide`, `require`s, the factory
//! body with its returns turned into namespace assignments.

use oxc_allocator::{Allocator, Box as oxc_box, Vec as ArenaVec};
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_span::{Span, SPAN};

use crate::namespace::Namespace;

// ═══════════════════════════════════════════════════════════════════════════════
// NAMESPACE NODES
// ═══════════════════════════════════════════════════════════════════════════════

/// A namespace in assignment-target position, convertible into each of the
/// target enums that share these two variants.
pub enum NamespaceTarget<'a> {
    Identifier(oxc_box<'a, IdentifierReference<'a>>),
    Member(oxc_box<'a, StaticMemberExpression<'a>>),
}

impl<'a> NamespaceTarget<'a> {
    pub fn into_simple(self) -> SimpleAssignmentTarget<'a> {
        match self {
            NamespaceTarget::Identifier(id) => SimpleAssignmentTarget::AssignmentTargetIdentifier(id),
            NamespaceTarget::Member(member) => SimpleAssignmentTarget::StaticMemberExpression(member),
        }
    }

    pub fn into_assignment(self) -> AssignmentTarget<'a> {
        match self {
            NamespaceTarget::Identifier(id) => AssignmentTarget::AssignmentTargetIdentifier(id),
            NamespaceTarget::Member(member) => AssignmentTarget::StaticMemberExpression(member),
        }
    }

    pub fn into_for_left(self) -> ForStatementLeft<'a> {
        match self {
            NamespaceTarget::Identifier(id) => ForStatementLeft::AssignmentTargetIdentifier(id),
            NamespaceTarget::Member(member) => ForStatementLeft::StaticMemberExpression(member),
        }
    }
}

fn split_namespace(ns: &Namespace) -> (&str, &[String]) {
    ns.segments()
        .split_first()
        .map(|(first, rest)| (first.as_str(), rest))
        .unwrap_or(("_", &[]))
}

/// `a.b.c` as a static member chain rooted at identifier `a`.
pub fn namespace_expression<'a>(ast: AstBuilder<'a>, ns: &Namespace) -> Expression<'a> {
    let (first, rest) = split_namespace(ns);
    let root: &'a str = ast.allocator.alloc_str(first);
    let mut expr = ast.expression_identifier(SPAN, root);
    for segment in rest {
        let name: &'a str = ast.allocator.alloc_str(segment);
        expr = Expression::from(ast.member_expression_static(
            SPAN,
            expr,
            ast.identifier_name(SPAN, name),
            false,
        ));
    }
    expr
}

pub fn namespace_target<'a>(ast: AstBuilder<'a>, ns: &Namespace) -> NamespaceTarget<'a> {
    let segments = ns.segments();
    match segments.split_last() {
        Some((last, parent)) if !parent.is_empty() => {
            let object = namespace_expression(ast, &Namespace::new(parent.to_vec()));
            let name: &'a str = ast.allocator.alloc_str(last);
            NamespaceTarget::Member(ast.alloc_static_member_expression(
                SPAN,
                object,
                ast.identifier_name(SPAN, name),
                false,
            ))
        }
        _ => {
            let name: &'a str = ast.allocator.alloc_str(ns.last());
            NamespaceTarget::Identifier(ast.alloc(ast.identifier_reference(SPAN, name)))
        }
    }
}

/// `ns = value`
pub fn namespace_assignment<'a>(
    ast: AstBuilder<'a>,
    ns: &Namespace,
    value: Expression<'a>,
) -> Expression<'a> {
    ast.expression_assignment(
        SPAN,
        AssignmentOperator::Assign,
        namespace_target(ast, ns).into_assignment(),
        value,
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROGRAM ASSEMBLER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct ProgramAssembler<'a> {
    pub ast: AstBuilder<'a>,
    target_object: Namespace,
}

impl<'a> ProgramAssembler<'a> {
    /// `target_object` names the object carrying `provide`/`require`
    /// (`goog` for the Closure Library); dotted paths are allowed.
    pub fn new(allocator: &'a Allocator, target_object: &str) -> Self {
        let segments = target_object
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        Self {
            ast: AstBuilder::new(allocator),
            target_object: Namespace::new(segments),
        }
    }

    fn target_call(&self, span: Span, method: &str, ns: &Namespace) -> Statement<'a> {
        let method: &'a str = self.ast.allocator.alloc_str(method);
        let callee = Expression::from(self.ast.member_expression_static(
            SPAN,
            namespace_expression(self.ast, &self.target_object),
            self.ast.identifier_name(SPAN, method),
            false,
        ));

        let dotted: &'a str = self.ast.allocator.alloc_str(&ns.dotted());
        let mut args = self.ast.vec();
        args.push(Argument::from(
            self.ast.expression_string_literal(SPAN, dotted, None),
        ));

        self.ast.statement_expression(
            span,
            self.ast.expression_call(
                SPAN,
                callee,
                None::<oxc_box<TSTypeParameterInstantiation>>,
                args,
                false,
            ),
        )
    }

    /// `goog.provide('ns');` carrying `span` so comments leading the
    /// original `define` stay at the top of the output.
    pub fn provide(&self, span: Span, ns: &Namespace) -> Statement<'a> {
        self.target_call(span, "provide", ns)
    }

    pub fn require(&self, ns: &Namespace) -> Statement<'a> {
        self.target_call(SPAN, "require", ns)
    }

    /// `ns = value;`
    pub fn export(&self, ns: &Namespace, value: Expression<'a>) -> Statement<'a> {
        self.ast
            .statement_expression(SPAN, namespace_assignment(self.ast, ns, value))
    }

    /// Turns `return value;` statements of the factory body into
    /// `ns = value;` in place. A bare `return;` contributes nothing.
    /// Returns nested in blocks or inner functions are left alone.
    pub fn replace_returns(&self, body: &mut ArenaVec<'a, Statement<'a>>, own: &Namespace) {
        for stmt in body.iter_mut() {
            if let Statement::ReturnStatement(ret) = stmt {
                if let Some(value) = ret.argument.take() {
                    *stmt = self.export(own, value);
                }
            }
        }
        body.retain(|stmt| !matches!(stmt, Statement::ReturnStatement(_)));
    }

    fn preamble(&self, span: Span, own: &Namespace, dependencies: &[Namespace]) -> ArenaVec<'a, Statement<'a>> {
        let mut out = self.ast.vec();
        out.push(self.provide(span, own));
        for dep in dependencies {
            out.push(self.require(dep));
        }
        out
    }

    /// provide, requires, then the (already rewritten) factory body.
    pub fn assemble_factory(
        &self,
        span: Span,
        own: &Namespace,
        dependencies: &[Namespace],
        mut body: ArenaVec<'a, Statement<'a>>,
    ) -> ArenaVec<'a, Statement<'a>> {
        self.replace_returns(&mut body, own);
        let mut out = self.preamble(span, own, dependencies);
        for stmt in body {
            out.push(stmt);
        }
        out
    }

    /// provide followed by `ns = {...};`
    pub fn assemble_object(
        &self,
        span: Span,
        own: &Namespace,
        object: Expression<'a>,
    ) -> ArenaVec<'a, Statement<'a>> {
        let mut out = self.preamble(span, own, &[]);
        out.push(self.export(own, object));
        out
    }
}
