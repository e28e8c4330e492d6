//! Identifier substitution over a factory body.
//!
//! Dependency parameters become the dependency's namespace, root-level
//! declarations move into the unit namespace (`ns$name`). Only identifier
//! *references* are candidates: property keys and member property names are
//! `IdentifierName`s in the tree and are never touched, so `foo.bar.baz`
//! only ever rewrites `foo` and `{ bs: bs }` only rewrites the value.

use oxc_allocator::{Allocator, Box as oxc_box, Vec as ArenaVec};
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_ast_visit::walk_mut::{
    walk_arrow_function_expression, walk_catch_clause, walk_class, walk_expression,
    walk_function, walk_object_property, walk_simple_assignment_target, walk_statement,
    walk_statements, walk_static_block,
};
use oxc_ast_visit::VisitMut;
use oxc_span::SPAN;
use oxc_syntax::scope::ScopeFlags;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::assembler::{namespace_assignment, namespace_expression, namespace_target};
use crate::namespace::Namespace;
use crate::scope::{
    build_root_binding_map, collect_local_names, collect_pattern_names, function_scope_names,
};
use crate::shape::DependencySpec;

// ═══════════════════════════════════════════════════════════════════════════════
// SUBSTITUTION PLAN
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable lookup tables computed before any rewriting happens.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionPlan {
    /// factory parameter → dependency namespace
    pub module_params: HashMap<String, Namespace>,
    /// root declaration → mangled namespace
    pub root_bindings: HashMap<String, Namespace>,
}

impl SubstitutionPlan {
    pub fn build(
        dependencies: &[DependencySpec],
        dependency_namespaces: &[Namespace],
        root_names: &[String],
        own: &Namespace,
    ) -> Self {
        let module_params = dependencies
            .iter()
            .zip(dependency_namespaces)
            .filter_map(|(spec, ns)| spec.param.as_ref().map(|p| (p.clone(), ns.clone())))
            .collect();

        SubstitutionPlan {
            module_params,
            root_bindings: build_root_binding_map(root_names, own),
        }
    }

    /// Dependency parameters shadow root declarations of the same name.
    pub fn resolve(&self, name: &str) -> Option<&Namespace> {
        self.module_params
            .get(name)
            .or_else(|| self.root_bindings.get(name))
    }

    /// The mangled home of `name`, if it is a root declaration that no
    /// dependency parameter shadows.
    pub fn root_target(&self, name: &str) -> Option<&Namespace> {
        if self.module_params.contains_key(name) {
            return None;
        }
        self.root_bindings.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.module_params.is_empty() && self.root_bindings.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTIFIER REWRITER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct IdentifierRewriter<'a, 'p> {
    pub ast: AstBuilder<'a>,
    plan: &'p SubstitutionPlan,
    /// Names bound by enclosing nested functions and catch clauses.
    scope_stack: Vec<HashSet<String>>,
    function_depth: usize,
    pub rewrites: usize,
    /// Source names that were substituted or lowered at least once.
    pub rewritten: BTreeSet<String>,
}

impl<'a, 'p> IdentifierRewriter<'a, 'p> {
    pub fn new(allocator: &'a Allocator, plan: &'p SubstitutionPlan) -> Self {
        Self {
            ast: AstBuilder::new(allocator),
            plan,
            scope_stack: Vec::new(),
            function_depth: 0,
            rewrites: 0,
            rewritten: BTreeSet::new(),
        }
    }

    /// Rewrites a whole factory body in place.
    pub fn rewrite_statements(&mut self, statements: &mut ArenaVec<'a, Statement<'a>>) {
        if self.plan.is_empty() {
            return;
        }
        self.visit_statements(statements);
    }

    pub fn rewrite_expression(&mut self, expr: &mut Expression<'a>) {
        if self.plan.is_empty() {
            return;
        }
        self.visit_expression(expr);
    }

    fn is_shadowed(&self, name: &str) -> bool {
        self.scope_stack.iter().rev().any(|s| s.contains(name))
    }

    fn lookup(&self, name: &str) -> Option<&'p Namespace> {
        if self.is_shadowed(name) {
            return None;
        }
        self.plan.resolve(name)
    }

    /// Declarations only move into the namespace outside nested functions.
    fn lowerable(&self, name: &str) -> Option<&'p Namespace> {
        if self.function_depth > 0 || self.is_shadowed(name) {
            return None;
        }
        self.plan.root_target(name)
    }

    fn lowerable_declarator(&self, declarator: &VariableDeclarator<'a>) -> Option<&'p Namespace> {
        match &declarator.id {
            BindingPattern::BindingIdentifier(id) => self.lowerable(&id.name),
            _ => None,
        }
    }

    fn record(&mut self, name: &str, ns: &Namespace) {
        self.rewrites += 1;
        self.rewritten.insert(name.to_string());
        log::debug!("rewriting identifier: {} -> {}", name, ns);
    }

    /// `ns$x = init` for a lowerable declarator; the initializer is
    /// rewritten first and the result is never visited again.
    fn lower_declarator(
        &mut self,
        mut declarator: VariableDeclarator<'a>,
        ns: &Namespace,
    ) -> Expression<'a> {
        let mut value = declarator
            .init
            .take()
            .unwrap_or_else(|| self.ast.expression_identifier(SPAN, "undefined"));
        self.visit_expression(&mut value);
        if let BindingPattern::BindingIdentifier(id) = &declarator.id {
            let name = id.name.to_string();
            self.record(&name, ns);
        }
        namespace_assignment(self.ast, ns, value)
    }

    fn sequence(&self, mut expressions: ArenaVec<'a, Expression<'a>>) -> Expression<'a> {
        if expressions.len() == 1 {
            if let Some(expr) = expressions.pop() {
                return expr;
            }
        }
        self.ast.expression_sequence(SPAN, expressions)
    }

    /// Lowers a declaration whose declarators all move into the namespace.
    /// Returns the declaration untouched otherwise.
    fn lower_whole_declaration(
        &mut self,
        mut decl: oxc_box<'a, VariableDeclaration<'a>>,
    ) -> Result<Expression<'a>, oxc_box<'a, VariableDeclaration<'a>>> {
        let all_lowerable = !decl.declarations.is_empty()
            && decl
                .declarations
                .iter()
                .all(|d| self.lowerable_declarator(d).is_some());
        if !all_lowerable {
            return Err(decl);
        }

        let declarators = std::mem::replace(&mut decl.declarations, self.ast.vec());
        let mut assignments = self.ast.vec();
        for declarator in declarators {
            if let Some(ns) = self.lowerable_declarator(&declarator) {
                assignments.push(self.lower_declarator(declarator, ns));
            }
        }
        Ok(self.sequence(assignments))
    }

    /// Splits a declaration into runs of namespace assignments and residual
    /// declarations, keeping declarator order.
    fn lower_declaration_into(
        &mut self,
        mut decl: oxc_box<'a, VariableDeclaration<'a>>,
        out: &mut ArenaVec<'a, Statement<'a>>,
    ) {
        let kind = decl.kind;
        let declarators = std::mem::replace(&mut decl.declarations, self.ast.vec());
        let mut assignments = self.ast.vec();
        let mut residual = self.ast.vec();

        for mut declarator in declarators {
            match self.lowerable_declarator(&declarator) {
                Some(ns) => {
                    if !residual.is_empty() {
                        let group = std::mem::replace(&mut residual, self.ast.vec());
                        out.push(Statement::VariableDeclaration(
                            self.ast.alloc_variable_declaration(SPAN, kind, group, false),
                        ));
                    }
                    assignments.push(self.lower_declarator(declarator, ns));
                }
                None => {
                    if !assignments.is_empty() {
                        let group = std::mem::replace(&mut assignments, self.ast.vec());
                        let expr = self.sequence(group);
                        out.push(self.ast.statement_expression(SPAN, expr));
                    }
                    self.visit_variable_declarator(&mut declarator);
                    residual.push(declarator);
                }
            }
        }

        if !assignments.is_empty() {
            let expr = self.sequence(assignments);
            out.push(self.ast.statement_expression(SPAN, expr));
        }
        if !residual.is_empty() {
            decl.declarations = residual;
            out.push(Statement::VariableDeclaration(decl));
        }
    }

    /// `function f() {}` → `ns$f = function f() {};`
    fn lower_function(&mut self, mut func: oxc_box<'a, Function<'a>>, ns: &Namespace) -> Statement<'a> {
        func.r#type = FunctionType::FunctionExpression;
        if let Some(id) = &func.id {
            let name = id.name.to_string();
            self.record(&name, ns);
        }
        let mut value = Expression::FunctionExpression(func);
        self.visit_expression(&mut value);
        self.ast
            .statement_expression(SPAN, namespace_assignment(self.ast, ns, value))
    }

    fn lowerable_function(&self, func: &Function<'a>) -> Option<&'p Namespace> {
        func.id.as_ref().and_then(|id| self.lowerable(&id.name))
    }

    fn lower_for_left(&mut self, left: &mut ForStatementLeft<'a>) -> bool {
        let target = match left {
            ForStatementLeft::VariableDeclaration(decl) if decl.declarations.len() == 1 => {
                let declarator = &decl.declarations[0];
                match (&declarator.id, self.lowerable_declarator(declarator)) {
                    (BindingPattern::BindingIdentifier(id), Some(ns)) => Some((id.name.to_string(), ns)),
                    _ => None,
                }
            }
            _ => None,
        };
        match target {
            Some((name, ns)) => {
                self.record(&name, ns);
                *left = namespace_target(self.ast, ns).into_for_left();
                true
            }
            None => false,
        }
    }
}

impl<'a, 'p> VisitMut<'a> for IdentifierRewriter<'a, 'p> {
    fn visit_statements(&mut self, statements: &mut ArenaVec<'a, Statement<'a>>) {
        if self.function_depth > 0 {
            walk_statements(self, statements);
            return;
        }

        // Root level: hoisted function assignments first, then the rest in order.
        let original = std::mem::replace(statements, self.ast.vec());
        let mut hoisted = self.ast.vec();
        let mut rest = self.ast.vec();

        for stmt in original {
            match stmt {
                Statement::FunctionDeclaration(func) => match self.lowerable_function(&func) {
                    Some(ns) => hoisted.push(self.lower_function(func, ns)),
                    None => {
                        let mut stmt = Statement::FunctionDeclaration(func);
                        self.visit_statement(&mut stmt);
                        rest.push(stmt);
                    }
                },
                Statement::VariableDeclaration(decl) => {
                    self.lower_declaration_into(decl, &mut rest);
                }
                mut other => {
                    self.visit_statement(&mut other);
                    rest.push(other);
                }
            }
        }

        for stmt in rest {
            hoisted.push(stmt);
        }
        *statements = hoisted;
    }

    fn visit_statement(&mut self, stmt: &mut Statement<'a>) {
        // Declarations outside a statement list (`if (x) var a = 1;`).
        if self.function_depth == 0 {
            if let Statement::VariableDeclaration(_) = stmt {
                let taken = std::mem::replace(stmt, self.ast.statement_empty(SPAN));
                if let Statement::VariableDeclaration(decl) = taken {
                    *stmt = match self.lower_whole_declaration(decl) {
                        Ok(expr) => self.ast.statement_expression(SPAN, expr),
                        Err(decl) => {
                            let mut stmt = Statement::VariableDeclaration(decl);
                            walk_statement(self, &mut stmt);
                            stmt
                        }
                    };
                }
                return;
            }
        }
        walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &mut Expression<'a>) {
        if let Expression::Identifier(ident) = expr {
            let name = ident.name.to_string();
            if let Some(ns) = self.lookup(&name) {
                self.record(&name, ns);
                *expr = namespace_expression(self.ast, ns);
            }
            return;
        }
        walk_expression(self, expr);
    }

    fn visit_object_property(&mut self, prop: &mut ObjectProperty<'a>) {
        // `{ foo }` must become `{ foo: <ns> }` so the key survives.
        if prop.shorthand {
            if let Expression::Identifier(ident) = &prop.value {
                if self.lookup(&ident.name).is_some() {
                    prop.shorthand = false;
                }
            }
        }
        walk_object_property(self, prop);
    }

    fn visit_simple_assignment_target(&mut self, target: &mut SimpleAssignmentTarget<'a>) {
        if let SimpleAssignmentTarget::AssignmentTargetIdentifier(ident) = target {
            let name = ident.name.to_string();
            if let Some(ns) = self.lookup(&name) {
                self.record(&name, ns);
                *target = namespace_target(self.ast, ns).into_simple();
            }
            return;
        }
        walk_simple_assignment_target(self, target);
    }

    fn visit_for_statement(&mut self, stmt: &mut ForStatement<'a>) {
        let lowered = match stmt.init.take() {
            Some(ForStatementInit::VariableDeclaration(decl)) if self.function_depth == 0 => {
                match self.lower_whole_declaration(decl) {
                    Ok(expr) => {
                        stmt.init = Some(ForStatementInit::from(expr));
                        true
                    }
                    Err(decl) => {
                        stmt.init = Some(ForStatementInit::VariableDeclaration(decl));
                        false
                    }
                }
            }
            other => {
                stmt.init = other;
                false
            }
        };

        if !lowered {
            if let Some(init) = &mut stmt.init {
                self.visit_for_statement_init(init);
            }
        }
        if let Some(test) = &mut stmt.test {
            self.visit_expression(test);
        }
        if let Some(update) = &mut stmt.update {
            self.visit_expression(update);
        }
        self.visit_statement(&mut stmt.body);
    }

    fn visit_for_in_statement(&mut self, stmt: &mut ForInStatement<'a>) {
        if !self.lower_for_left(&mut stmt.left) {
            self.visit_for_statement_left(&mut stmt.left);
        }
        self.visit_expression(&mut stmt.right);
        self.visit_statement(&mut stmt.body);
    }

    fn visit_for_of_statement(&mut self, stmt: &mut ForOfStatement<'a>) {
        if !self.lower_for_left(&mut stmt.left) {
            self.visit_for_statement_left(&mut stmt.left);
        }
        self.visit_expression(&mut stmt.right);
        self.visit_statement(&mut stmt.body);
    }

    fn visit_function(&mut self, func: &mut Function<'a>, flags: ScopeFlags) {
        let names = function_scope_names(func.id.as_ref(), &func.params, func.body.as_deref());
        self.scope_stack.push(names);
        self.function_depth += 1;
        walk_function(self, func, flags);
        self.function_depth -= 1;
        self.scope_stack.pop();
    }

    fn visit_arrow_function_expression(&mut self, func: &mut ArrowFunctionExpression<'a>) {
        let names = function_scope_names(None, &func.params, Some(&*func.body));
        self.scope_stack.push(names);
        self.function_depth += 1;
        walk_arrow_function_expression(self, func);
        self.function_depth -= 1;
        self.scope_stack.pop();
    }

    /// Class bodies are not root scope: `static {}` declarations stay local.
    fn visit_class(&mut self, class: &mut Class<'a>) {
        self.function_depth += 1;
        walk_class(self, class);
        self.function_depth -= 1;
    }

    fn visit_static_block(&mut self, block: &mut StaticBlock<'a>) {
        let mut names = HashSet::new();
        collect_local_names(&block.body, &mut names);
        self.scope_stack.push(names);
        walk_static_block(self, block);
        self.scope_stack.pop();
    }

    fn visit_catch_clause(&mut self, clause: &mut CatchClause<'a>) {
        let mut names = HashSet::new();
        if let Some(param) = &clause.param {
            collect_pattern_names(&param.pattern, &mut names);
        }
        self.scope_stack.push(names);
        walk_catch_clause(self, clause);
        self.scope_stack.pop();
    }
}
