use oxc_ast::ast::*;
use oxc_ast_visit::Visit;
use oxc_syntax::scope::ScopeFlags;
use std::collections::{HashMap, HashSet};

use crate::namespace::Namespace;

/// Collects the names declared directly in one function scope.
///
/// Variable declarators and function declarations are recorded at any block
/// depth, but nested functions (and classes, whose members are functions)
/// are never entered: their declarations belong to another scope.
#[derive(Debug, Default)]
pub struct ScopeCollector {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl ScopeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.names.push(name.to_string());
        }
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

impl<'a> Visit<'a> for ScopeCollector {
    fn visit_variable_declarator(&mut self, decl: &VariableDeclarator<'a>) {
        if let BindingPattern::BindingIdentifier(id) = &decl.id {
            self.record(&id.name);
        }
        if let Some(init) = &decl.init {
            self.visit_expression(init);
        }
    }

    fn visit_function(&mut self, func: &Function<'a>, _flags: ScopeFlags) {
        if func.r#type == FunctionType::FunctionDeclaration {
            if let Some(id) = &func.id {
                self.record(&id.name);
            }
        }
    }

    fn visit_arrow_function_expression(&mut self, _func: &ArrowFunctionExpression<'a>) {}

    fn visit_class(&mut self, _class: &Class<'a>) {}
}

/// Names declared at the top level of a factory body, in source order.
pub fn collect_root_bindings(statements: &[Statement]) -> Vec<String> {
    let mut collector = ScopeCollector::new();
    for stmt in statements {
        collector.visit_statement(stmt);
    }
    collector.into_names()
}

/// Maps every root name to its mangled home under the unit namespace.
pub fn build_root_binding_map(names: &[String], own: &Namespace) -> HashMap<String, Namespace> {
    names
        .iter()
        .map(|name| (name.clone(), own.mangle(name)))
        .collect()
}

/// Gathers binding identifiers of patterns and parameter lists, without
/// entering default-value functions.
struct BindingNameCollector<'n> {
    names: &'n mut HashSet<String>,
}

impl<'a, 'n> Visit<'a> for BindingNameCollector<'n> {
    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        self.names.insert(ident.name.to_string());
    }

    fn visit_function(&mut self, _func: &Function<'a>, _flags: ScopeFlags) {}

    fn visit_arrow_function_expression(&mut self, _func: &ArrowFunctionExpression<'a>) {}

    fn visit_class(&mut self, _class: &Class<'a>) {}
}

pub fn collect_pattern_names(pattern: &BindingPattern, names: &mut HashSet<String>) {
    BindingNameCollector { names }.visit_binding_pattern(pattern);
}

/// Like [`ScopeCollector`], but for shadowing: every identifier bound by a
/// declarator pattern counts, and so do class declarations.
struct LocalNameCollector<'n> {
    names: &'n mut HashSet<String>,
}

impl<'a, 'n> Visit<'a> for LocalNameCollector<'n> {
    fn visit_variable_declarator(&mut self, decl: &VariableDeclarator<'a>) {
        collect_pattern_names(&decl.id, self.names);
        if let Some(init) = &decl.init {
            self.visit_expression(init);
        }
    }

    fn visit_function(&mut self, func: &Function<'a>, _flags: ScopeFlags) {
        if func.r#type == FunctionType::FunctionDeclaration {
            if let Some(id) = &func.id {
                self.names.insert(id.name.to_string());
            }
        }
    }

    fn visit_arrow_function_expression(&mut self, _func: &ArrowFunctionExpression<'a>) {}

    fn visit_class(&mut self, class: &Class<'a>) {
        if class.r#type == ClassType::ClassDeclaration {
            if let Some(id) = &class.id {
                self.names.insert(id.name.to_string());
            }
        }
    }
}

/// All names declared in a statement list outside nested functions.
pub fn collect_local_names(statements: &[Statement], names: &mut HashSet<String>) {
    let mut collector = LocalNameCollector { names };
    for stmt in statements {
        collector.visit_statement(stmt);
    }
}

/// Every binding a nested function introduces: its parameters, its own
/// name and the declarations of its body.
pub fn function_scope_names(
    id: Option<&BindingIdentifier>,
    params: &FormalParameters,
    body: Option<&FunctionBody>,
) -> HashSet<String> {
    let mut names = HashSet::new();
    if let Some(id) = id {
        names.insert(id.name.to_string());
    }
    BindingNameCollector { names: &mut names }.visit_formal_parameters(params);
    if let Some(body) = body {
        collect_local_names(&body.statements, &mut names);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn root_names(code: &str) -> Vec<String> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, code, SourceType::default().with_module(false)).parse();
        assert!(ret.errors.is_empty(), "parse errors: {:?}", ret.errors);
        collect_root_bindings(&ret.program.body)
    }

    #[test]
    fn test_collects_vars_and_functions() {
        let names = root_names("var a = 1, b; let c = 2; function d() {} const e = 3;");
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_collects_in_nested_blocks() {
        let names = root_names(
            "if (x) { var a = 1; } for (var i = 0; i < 2; i++) {} for (var k in o) {} try { var t; } catch (e) {}",
        );
        assert_eq!(names, vec!["a", "i", "k", "t"]);
    }

    #[test]
    fn test_skips_nested_functions() {
        let names = root_names(
            "function outer() { var inner = 1; function deeper() {} } var f = function () { var hidden; }; var g = () => { var alsoHidden; };",
        );
        assert_eq!(names, vec!["outer", "f", "g"]);
    }

    #[test]
    fn test_skips_destructuring_and_duplicates() {
        let names = root_names("var { a, b } = o; var c = 1; var c = 2;");
        assert_eq!(names, vec!["c"]);
    }

    #[test]
    fn test_function_scope_names_include_params() {
        let allocator = Allocator::default();
        let code = "function f(a, { b, c: [d] }, e = function (x) {}, ...rest) { var local; }";
        let ret = Parser::new(&allocator, code, SourceType::default().with_module(false)).parse();
        let Statement::FunctionDeclaration(func) = &ret.program.body[0] else {
            panic!("expected a function declaration");
        };
        let names = function_scope_names(func.id.as_ref(), &func.params, func.body.as_deref());
        for expected in ["f", "a", "b", "d", "e", "rest", "local"] {
            assert!(names.contains(expected), "missing {}", expected);
        }
        assert!(!names.contains("x"));
        assert!(!names.contains("c"));
    }

    #[test]
    fn test_function_scope_names_include_destructured_locals() {
        let allocator = Allocator::default();
        let code = "function f(o, xs, m) { var { dep } = o; const [a, b] = xs; for (const [k, v] of m) {} class Local {} var g = function () { var hidden; }; }";
        let ret = Parser::new(&allocator, code, SourceType::default().with_module(false)).parse();
        assert!(ret.errors.is_empty(), "parse errors: {:?}", ret.errors);
        let Statement::FunctionDeclaration(func) = &ret.program.body[0] else {
            panic!("expected a function declaration");
        };
        let names = function_scope_names(func.id.as_ref(), &func.params, func.body.as_deref());
        for expected in ["dep", "a", "b", "k", "v", "Local", "g"] {
            assert!(names.contains(expected), "missing {}", expected);
        }
        assert!(!names.contains("hidden"));
    }

    #[test]
    fn test_root_binding_map_mangles() {
        let own = Namespace::new(vec!["app".to_string(), "main".to_string()]);
        let map = build_root_binding_map(&["helper".to_string()], &own);
        assert_eq!(map["helper"].dotted(), "app.main$helper");
    }
}
