//! End-to-end tests: source in, printed Closure code out.
//!
//! Exact-text cases run with `format: false` (no comments), matching what
//! the Closure build consumes.

#[cfg(test)]
mod tests {
    use crate::diagnostics::{
        TransformError, DIAG_COMMONJS_WRAPPER, DIAG_DISCARDED_STATEMENTS, DIAG_IGNORED_IDENTIFIER,
        DIAG_UNBOUND_PARAM, DIAG_UNRECOGNIZED_SHAPE,
    };
    use crate::options::TransformOptions;
    use crate::transform::{transform, TransformResult};
    use pretty_assertions::assert_eq;

    fn opts() -> TransformOptions {
        TransformOptions::default().with_format(false)
    }

    fn run(unit: &str, source: &str) -> TransformResult {
        transform(unit, source, &opts()).expect("transform failed")
    }

    fn code(unit: &str, source: &str) -> String {
        run(unit, source).code
    }

    fn codes(result: &TransformResult) -> Vec<&str> {
        result.diagnostics.iter().map(|d| d.code.as_str()).collect()
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // ACCEPTED SHAPES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_factory() {
        assert_eq!(
            code("ns", r#"define(function () { return "foo"; });"#),
            "goog.provide('ns');\nns = 'foo';"
        );
    }

    #[test]
    fn test_factory_nested_namespace() {
        assert_eq!(
            code("ns/bs", r#"define(function () { return "foo"; });"#),
            "goog.provide('ns.bs');\nns.bs = 'foo';"
        );
    }

    #[test]
    fn test_factory_with_dependencies() {
        assert_eq!(
            code("ns", r#"define(["bs", "as"], function (bs, as) { return bs + as; });"#),
            "goog.provide('ns');\ngoog.require('bs');\ngoog.require('as');\nns = bs + as;"
        );
    }

    #[test]
    fn test_dependency_params_are_renamed() {
        assert_eq!(
            code(
                "ns",
                r#"define(["bs", "as"], function (bsLocal, asLocal) { return bsLocal + asLocal; });"#
            ),
            "goog.provide('ns');\ngoog.require('bs');\ngoog.require('as');\nns = bs + as;"
        );
    }

    #[test]
    fn test_nested_dependency_namespaces() {
        assert_eq!(
            code("ns", r#"define(["bs/sb", "as/sa"], function (sb, sa) { return sb + sa; });"#),
            "goog.provide('ns');\ngoog.require('bs.sb');\ngoog.require('as.sa');\nns = bs.sb + as.sa;"
        );
    }

    #[test]
    fn test_identified_factory_ignores_id() {
        let result = run("ns", r#"define("ons", ["bs"], function (bs) { return bs; });"#);
        assert_eq!(result.code, "goog.provide('ns');\ngoog.require('bs');\nns = bs;");
        assert_eq!(codes(&result), vec![DIAG_IGNORED_IDENTIFIER]);
        assert!(result.diagnostics[0].message.contains("ons"));
    }

    #[test]
    fn test_object_literal() {
        assert_eq!(
            code("ns", r#"define({ hello: "world" });"#),
            "goog.provide('ns');\nns = { hello: 'world' };"
        );
    }

    #[test]
    fn test_result_metadata() {
        let result = run("app/main.js", r#"define(["lib/a", "lib/b"], function (a) { return a; });"#);
        assert!(result.transformed);
        assert_eq!(result.namespace.as_deref(), Some("app.main"));
        assert_eq!(result.requires, vec!["lib.a".to_string(), "lib.b".to_string()]);
        assert!(result.diagnostics.is_empty());
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // PASS-THROUGH
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_non_amd_passes_through_verbatim() {
        let source = "var  x = 1;  // spacing kept\nfoo( x );\n";
        let result = run("plain.js", source);
        assert!(!result.transformed);
        assert_eq!(result.code, source);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_nested_define_is_not_a_definition() {
        let source = "(function () { define(function () { return 1; }); })();";
        assert_eq!(code("x", source), source);
        let assigned = "var m = define(function () { return 1; });";
        assert_eq!(code("x", assigned), assigned);
    }

    #[test]
    fn test_commonjs_wrapper_is_diagnosed() {
        let source = "define(function (require, exports, module) { exports.x = 1; });";
        let result = run("cjs.js", source);
        assert!(!result.transformed);
        assert_eq!(result.code, source);
        assert!(result.has_errors());
        assert_eq!(codes(&result), vec![DIAG_COMMONJS_WRAPPER]);
        assert_eq!(result.diagnostics[0].file, "cjs.js");
    }

    #[test]
    fn test_unrecognized_shape_passes_through() {
        let source = "define('only-an-id');";
        let result = run("x.js", source);
        assert!(!result.transformed);
        assert_eq!(result.code, source);
        assert_eq!(codes(&result), vec![DIAG_UNRECOGNIZED_SHAPE]);
    }

    #[test]
    fn test_output_is_idempotent() {
        let first = code("a/b.js", r#"define(["c"], function (c) { return c.d(); });"#);
        let second = code("a/b.js", &first);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_error_is_hard_failure() {
        let err = transform("bad.js", "define(function () {", &opts()).unwrap_err();
        match err {
            TransformError::Parse { file, messages } => {
                assert_eq!(file, "bad.js");
                assert!(!messages.is_empty());
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // IDENTIFIER POSITIONS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_keys_and_properties_untouched() {
        let out = code(
            "ns",
            "define(['lib/bs'], function (bs) { return { bs: bs, run: function () { return bs.bs; } }; });",
        );
        assert!(out.contains("bs: lib.bs,"), "got: {}", out);
        assert!(out.contains("return lib.bs.bs;"), "got: {}", out);
    }

    #[test]
    fn test_shadowing_in_nested_function() {
        let out = code(
            "ns",
            "define(['dep'], function (d) { function f(d) { return d; } return f(d); });",
        );
        assert!(out.contains("return d;"), "got: {}", out);
        assert!(out.contains("ns = ns$f(dep);"), "got: {}", out);
    }

    #[test]
    fn test_destructured_local_shadows_dependency() {
        let out = code(
            "ns",
            "define(['lib/dep'], function (dep) { function g(o) { var { dep } = o; return dep; } return g; });",
        );
        assert!(out.contains("var { dep } = o;"), "got: {}", out);
        assert!(out.contains("return dep;"), "got: {}", out);
        assert!(!out.contains("return lib.dep"), "got: {}", out);
    }

    #[test]
    fn test_return_only_at_factory_level() {
        let out = code(
            "ns",
            "define(function () { function inner() { return 1; } if (x) { return 2; } return inner(); });",
        );
        assert!(out.contains("return 1;"), "got: {}", out);
        assert!(out.contains("return 2;"), "got: {}", out);
        assert!(out.ends_with("ns = ns$inner();"), "got: {}", out);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // ROOT DECLARATIONS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_root_declarations_are_mangled() {
        assert_eq!(
            code(
                "app/counter.js",
                "define(function () { var count = 0; function inc() { count++; } return inc; });"
            ),
            "goog.provide('app.counter');\napp.counter$inc = function inc() {\n\tapp.counter$count++;\n};\napp.counter$count = 0;\napp.counter = app.counter$inc;"
        );
    }

    #[test]
    fn test_param_wins_over_root_declaration() {
        let out = code("ns", "define(['lib'], function (lib) { var lib = lib || {}; return lib; });");
        assert!(out.contains("var lib = lib || {};"), "got: {}", out);
        assert!(out.contains("ns = lib;"), "got: {}", out);
        assert!(!out.contains("ns$lib"), "got: {}", out);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // DIAGNOSTICS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_statements_outside_define_are_discarded() {
        let result = run("ns", "var before = 1;\ndefine(function () { return 1; });\nafter();");
        assert_eq!(result.code, "goog.provide('ns');\nns = 1;");
        assert_eq!(codes(&result), vec![DIAG_DISCARDED_STATEMENTS]);
        assert!(result.diagnostics[0].message.starts_with("2 "));
    }

    #[test]
    fn test_extra_params_left_untouched() {
        let result = run("ns", "define(['a'], function (a, extra) { return a(extra); });");
        assert_eq!(result.code, "goog.provide('ns');\ngoog.require('a');\nns = a(extra);");
        assert_eq!(codes(&result), vec![DIAG_UNBOUND_PARAM]);
    }

    #[test]
    fn test_unbound_dependencies_still_required() {
        let result = run("ns", "define(['a', 'polyfill'], function (a) { return a; });");
        assert_eq!(
            result.code,
            "goog.provide('ns');\ngoog.require('a');\ngoog.require('polyfill');\nns = a;"
        );
        assert!(result.diagnostics.is_empty());
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // OPTIONS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_global_namespace_and_foreign_libs() {
        let options = opts()
            .with_namespace("my.app")
            .with_foreign_libs(vec!["vendor".to_string()]);
        let result = transform(
            "views/list-view.js",
            "define(['models/user', 'vendor/jquery'], function (User, $) { return $(User); });",
            &options,
        )
        .unwrap();
        assert_eq!(
            result.code,
            "goog.provide('my.app.views.list_view');\ngoog.require('my.app.models.user');\ngoog.require('vendor.jquery');\nmy.app.views.list_view = vendor.jquery(my.app.models.user);"
        );
    }

    #[test]
    fn test_base_url_and_target_object() {
        let options = opts().with_base_url("src").with_target_object("loader");
        let result = transform("src/a/b.js", "define({});", &options).unwrap();
        assert_eq!(result.code, "loader.provide('a.b');\na.b = {};");
    }

    #[test]
    fn test_format_keeps_comments() {
        let source = "// header\ndefine(function () {\n  // explains\n  return 1;\n});";
        let kept = transform("ns", source, &TransformOptions::default()).unwrap();
        assert!(kept.code.contains("// header"), "got: {}", kept.code);
        let dropped = transform("ns", source, &opts()).unwrap();
        assert!(!dropped.code.contains("//"), "got: {}", dropped.code);
    }

    #[test]
    fn test_factory_directives_are_kept() {
        let out = code("ns", "define(function () { 'use strict'; return 1; });");
        assert_eq!(out, "'use strict';\ngoog.provide('ns');\nns = 1;");
    }
}
