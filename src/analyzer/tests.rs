//! Unit tests for the analysis phases, driven through whole modules.

use crate::{
    analyzer::{lowering::verify_lowered, overload::Binding},
    ast::{ast::NodeId, nodes::NodeKind, traverse::collect_preorder},
    compilation::{Compilation, CompilerOptions},
    context::ModuleId,
    errors::errors::Severity,
    loader::MemoryLoader,
    scope::decls::{DeclId, DeclKind},
    types::type_manager::TypeId,
};

fn analyze(source: &str) -> (Compilation, ModuleId) {
    let mut compilation = Compilation::from_source(source);
    let module = compilation.load_root("main").unwrap();
    compilation.analyze(module).unwrap();
    (compilation, module)
}

fn error_names(compilation: &Compilation) -> Vec<String> {
    compilation
        .diagnostics()
        .iter()
        .map(|error| error.get_error_name().to_string())
        .collect()
}

fn nodes_where(compilation: &Compilation, module: ModuleId, select: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
    let root = compilation.context.module(module).root;
    collect_preorder(&compilation.context.ast, root, |ast, node| select(ast.kind(node)))
}

fn top_level_decl(compilation: &Compilation, module: ModuleId, name: &str) -> DeclId {
    let private = compilation.context.module(module).layers.private;
    compilation.context.scopes.get_var_defs(private, name)[0]
}

fn var_decl_type(compilation: &Compilation, module: ModuleId, name: &str) -> Option<TypeId> {
    nodes_where(compilation, module, |kind| matches!(kind, NodeKind::VarDecl { .. }))
        .into_iter()
        .find_map(|node| match compilation.context.ast.kind(node) {
            NodeKind::VarDecl { decl, .. } if compilation.context.decls.get(*decl).name == name => {
                compilation.context.decls.get(*decl).ty
            }
            _ => None,
        })
}

#[test]
fn test_overload_prefers_cheapest_conversion() {
    let (compilation, module) = analyze(
        "fn f(x: int32) -> int32 { return x; }
         fn f(x: float32) -> float32 { return x; }
         fn main() { f(5); }",
    );
    assert!(!compilation.diagnostics().has_errors(), "{:?}", error_names(&compilation));

    let calls = nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::Call { .. }));
    assert_eq!(calls.len(), 1);

    let int_overload = top_level_decl(&compilation, module, "f");
    let annotation = compilation.context.ast.annotation(calls[0]);
    assert_eq!(annotation.binding, Some(Binding::Decl(int_overload)));
    assert_eq!(annotation.ty, Some(TypeId::INT32));
}

#[test]
fn test_step_operands_read_their_producers() {
    let (compilation, module) = analyze(
        "fn f(x: int32) -> int32 { return x; }
         fn f(x: float32) -> int32 { return 1; }
         fn main() { let y = f(5) + 1; }",
    );
    assert!(!compilation.diagnostics().has_errors(), "{:?}", error_names(&compilation));

    let temps = nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::Temp { .. }));
    assert!(!temps.is_empty());
    for temp in temps {
        let ty = compilation.context.ast.ty(temp);
        assert!(ty.is_some() && ty != Some(TypeId::ERROR), "{:?} untyped", temp);
    }

    let calls = nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::Call { .. }));
    assert!(compilation.context.ast.annotation(calls[0]).binding.is_some());
    assert_eq!(var_decl_type(&compilation, module, "y"), Some(TypeId::INT64));
}

#[test]
fn test_undeclared_call_reports_and_continues() {
    let (compilation, module) = analyze("fn main() { g(1, 2); let y: int32 = 3; }");

    let error = compilation.diagnostics().find("VariableNotDeclared").unwrap();
    assert!(error.is_hard());
    assert_eq!(compilation.diagnostics().error_count(), 1);

    let calls = nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::Call { .. }));
    assert_eq!(compilation.context.ast.ty(calls[0]), Some(TypeId::ERROR));
    assert_eq!(var_decl_type(&compilation, module, "y"), Some(TypeId::INT32));
}

#[test]
fn test_constant_condition_keeps_taken_arm() {
    let (compilation, module) = analyze(
        "fn main() {
             let a: int32 = 0;
             if (true) a = 1; else a = 2;
         }",
    );

    let nitpick = compilation.diagnostics().find("ConstantCondition").unwrap();
    assert_eq!(nitpick.get_severity(), Severity::Nitpick);
    assert!(!compilation.diagnostics().has_errors());

    assert!(nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::If)).is_empty());
    let assignments = nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::Assign));
    assert_eq!(assignments.len(), 1);

    let literals: Vec<i64> = nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::Literal))
        .into_iter()
        .filter_map(|node| compilation.context.ast.annotation(node).value.as_ref()?.as_i64())
        .collect();
    assert!(literals.contains(&1));
    assert!(!literals.contains(&2));
}

#[test]
fn test_constant_false_loop_is_removed() {
    let (compilation, module) = analyze("fn main() { while false { main(); } }");

    assert!(compilation.diagnostics().find("ConstantCondition").is_some());
    assert!(nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::While)).is_empty());
}

#[test]
fn test_lowered_tree_has_only_temporary_operands() {
    let (compilation, module) = analyze(
        "fn main() {
             let i: int32 = 0;
             let x = if i < 3 { 1 } else { 2 };
             while i < 10 { i = i + 1; }
         }",
    );
    assert!(!compilation.diagnostics().has_errors(), "{:?}", error_names(&compilation));

    let root = compilation.context.module(module).root;
    assert_eq!(verify_lowered(&compilation.context, root), Ok(()));
    assert_eq!(compilation.context.ast.check_links(root), Ok(()));
    assert_eq!(var_decl_type(&compilation, module, "x"), Some(TypeId::INT64));
}

#[test]
fn test_mixed_operands_are_promoted() {
    let (compilation, module) = analyze(
        "fn main() {
             let a: int32 = 1;
             let b: int64 = 2;
             let c = a + b;
         }",
    );
    assert!(!compilation.diagnostics().has_errors(), "{:?}", error_names(&compilation));

    let casts = nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::Cast { .. }));
    assert_eq!(casts.len(), 1);
    assert_eq!(compilation.context.ast.ty(casts[0]), Some(TypeId::INT64));

    let parent = compilation.context.ast.parent(casts[0]).unwrap();
    assert!(matches!(compilation.context.ast.kind(parent), NodeKind::BasicBlock));

    assert_eq!(var_decl_type(&compilation, module, "c"), Some(TypeId::INT64));
    let root = compilation.context.module(module).root;
    assert_eq!(verify_lowered(&compilation.context, root), Ok(()));
}

#[test]
fn test_equal_operands_are_not_cast() {
    let (compilation, module) = analyze("fn main() { let a: int16 = 1; let b: int16 = 2; let c = a * b; }");
    assert!(!compilation.diagnostics().has_errors(), "{:?}", error_names(&compilation));

    assert!(nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::Cast { .. })).is_empty());
    assert_eq!(var_decl_type(&compilation, module, "c"), Some(TypeId::INT16));
}

#[test]
fn test_operators_become_intrinsic_calls() {
    let (compilation, module) = analyze("fn main() { let a: float64 = 1.5; let b = -a * 2.0; }");
    assert!(!compilation.diagnostics().has_errors(), "{:?}", error_names(&compilation));

    assert!(nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::Binary { .. })).is_empty());
    assert!(nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::Unary { .. })).is_empty());

    let intrinsics = nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::IntrinsicCall { .. }));
    assert_eq!(intrinsics.len(), 2);
    for node in intrinsics {
        assert!(matches!(
            compilation.context.ast.annotation(node).binding,
            Some(Binding::Intrinsic(_))
        ));
    }
}

#[test]
fn test_constants_fold_through_declarations() {
    let (compilation, module) = analyze(
        "const a = 2;
         const b = a * 3 + 1;
         const small: int8 = 100;
         const big = small + small;
         fn main() {}",
    );
    assert!(!compilation.diagnostics().has_errors(), "{:?}", error_names(&compilation));

    let b = top_level_decl(&compilation, module, "b");
    let value = compilation.context.decls.get(b).value.as_ref().unwrap();
    assert_eq!(value.as_i64(), Some(7));

    let big = top_level_decl(&compilation, module, "big");
    let big = compilation.context.decls.get(big);
    assert_eq!(big.ty, Some(TypeId::INT8));
    assert_eq!(big.value.as_ref().unwrap().as_i64(), Some(-56));
}

#[test]
fn test_division_by_zero_is_a_warning() {
    let (compilation, module) = analyze("const z = 1 / 0; fn main() {}");

    let warning = compilation.diagnostics().find("DivisionByZero").unwrap();
    assert_eq!(warning.get_severity(), Severity::Warning);
    assert!(!compilation.diagnostics().has_errors());

    let z = top_level_decl(&compilation, module, "z");
    assert!(compilation.context.decls.get(z).value.is_none());
}

#[test]
fn test_constant_indexing() {
    let (compilation, module) = analyze(
        "const xs = [1, 2, 3];
         const second = xs[1];
         const p = (a: 1, b: true);
         const flag = p.b;
         const missing = xs[5];
         fn main() {}",
    );

    let second = top_level_decl(&compilation, module, "second");
    assert_eq!(compilation.context.decls.get(second).value.as_ref().unwrap().as_i64(), Some(2));

    let flag = top_level_decl(&compilation, module, "flag");
    assert_eq!(compilation.context.decls.get(flag).value.as_ref().unwrap().as_bool(), Some(true));

    assert!(compilation.diagnostics().find("IndexOutOfBounds").is_some());
    assert_eq!(compilation.diagnostics().error_count(), 1);
}

#[test]
fn test_variable_used_before_declaration() {
    let (compilation, _) = analyze("fn main() { x = 1; let x = 2; }");
    assert_eq!(error_names(&compilation), vec!["UsedBeforeDeclaration"]);
}

#[test]
fn test_assigning_to_non_storage() {
    let (compilation, _) = analyze("fn main() { 1 = 2; }");
    assert_eq!(error_names(&compilation), vec!["NotAnLvalue"]);

    let (compilation, _) = analyze("const k = 1; fn main() { k = 2; }");
    assert_eq!(error_names(&compilation), vec!["NotAnLvalue"]);
}

#[test]
fn test_type_mismatch_in_declaration() {
    let (compilation, _) = analyze("fn main() { let flag: bool = 1; }");
    assert_eq!(error_names(&compilation), vec!["TypeMatchError"]);
}

#[test]
fn test_no_matching_operator() {
    let (compilation, _) = analyze("fn main() { let b = true + 1; }");
    assert_eq!(error_names(&compilation), vec!["NoMatchingOverload"]);
}

#[test]
fn test_return_outside_function() {
    let (compilation, _) = analyze("return 1; fn main() {}");
    assert_eq!(error_names(&compilation), vec!["ReturnOutsideFunction"]);
}

#[test]
fn test_recursive_type_is_rejected() {
    let (compilation, _) = analyze("type Loop = (int32, Loop); fn main() {}");

    let error = compilation.diagnostics().find("RecursiveType").unwrap();
    assert_eq!(error.get_notes().len(), 1);
}

#[test]
fn test_generic_type_instantiation() {
    let (mut compilation, module) = analyze(
        "type Pair<T> = (T, T);
         fn main() { let p: Pair<int32> = (1, 2); }",
    );
    assert!(!compilation.diagnostics().has_errors(), "{:?}", error_names(&compilation));

    let ty = var_decl_type(&compilation, module, "p").unwrap();
    assert_eq!(compilation.context.types.display(ty), "Pair<int32>");

    let expected = compilation
        .context
        .types
        .make_unnamed_tuple(&[TypeId::INT32, TypeId::INT32]);
    assert_eq!(compilation.context.types.strip_named(ty), expected);
}

#[test]
fn test_nominal_types_convert_to_their_expansion() {
    let (compilation, _) = analyze(
        "type Meters = int32;
         fn total(a: Meters, b: Meters) -> int32 { return a + b; }
         fn main() { let m: Meters = 3; total(m, m); }",
    );
    assert!(!compilation.diagnostics().has_errors(), "{:?}", error_names(&compilation));
}

#[test]
fn test_tied_overloads_are_ambiguous() {
    let (compilation, module) = analyze(
        "fn h(x: int16, y: int64) {}
         fn h(x: int64, y: int16) {}
         fn main() { h(1, 2); }",
    );

    let error = compilation.diagnostics().find("AmbiguousOverload").unwrap();
    assert_eq!(error.get_notes().len(), 2);

    let calls = nodes_where(&compilation, module, |kind| matches!(kind, NodeKind::Call { .. }));
    let first = top_level_decl(&compilation, module, "h");
    let annotation = compilation.context.ast.annotation(calls[0]);
    assert_eq!(annotation.binding, Some(Binding::Decl(first)));
    assert_eq!(annotation.ty, Some(TypeId::UNIT));
}

#[test]
fn test_references_bind_to_storage() {
    let (compilation, module) = analyze(
        "fn main() {
             let x: int32 = 1;
             let r @= x;
             r = 5;
         }",
    );
    assert!(!compilation.diagnostics().has_errors(), "{:?}", error_names(&compilation));

    let ty = var_decl_type(&compilation, module, "r").unwrap();
    assert_eq!(compilation.context.types.display(ty), "@int32");

    let (compilation, _) = analyze("fn main() { let x: int32 = 1; x @= x; }");
    assert_eq!(error_names(&compilation), vec!["NotAReference"]);
}

#[test]
fn test_cyclic_imports_terminate() {
    let loader = MemoryLoader::new()
        .with("main", "import util; fn main() { helper(); }")
        .with("util", "import main; export fn helper() -> int32 { return 1; }");
    let mut compilation = Compilation::new(CompilerOptions::default(), Box::new(loader));

    let output = compilation.compile("main").unwrap();
    assert!(!compilation.diagnostics().has_errors(), "{:?}", error_names(&compilation));
    assert_eq!(compilation.context.modules.len(), 2);
    assert!(compilation.context.modules.iter().all(|module| module.analyzed));
    assert_eq!(compilation.context.decls.get(output.entry).name, "main");
}

#[test]
fn test_private_items_are_not_imported() {
    let loader = MemoryLoader::new()
        .with("main", "import util; fn main() { hidden(); }")
        .with("util", "fn hidden() {}");
    let mut compilation = Compilation::new(CompilerOptions::default(), Box::new(loader));

    compilation.compile("main").unwrap();
    assert_eq!(error_names(&compilation), vec!["VariableNotDeclared"]);
}

#[test]
fn test_missing_module_is_fatal() {
    let mut compilation = Compilation::from_source("import nowhere; fn main() {}");

    let error = compilation.compile("main").unwrap_err();
    assert!(error.is_fatal());
    assert_eq!(error.get_error_name(), "ModuleNotFound");
}

#[test]
fn test_entry_point_errors_are_fatal() {
    let mut compilation = Compilation::from_source("fn helper() {}");
    let error = compilation.compile("main").unwrap_err();
    assert!(error.is_fatal());
    assert_eq!(error.get_error_name(), "NoEntryPoint");

    let mut compilation = Compilation::from_source("fn main(x: int32) {}");
    let error = compilation.compile("main").unwrap_err();
    assert_eq!(error.get_error_name(), "EntryPointNotCallable");
    assert_eq!(error.get_notes().len(), 1);

    let mut compilation = Compilation::from_source("const main = 1;");
    let error = compilation.compile("main").unwrap_err();
    assert!(error.is_fatal());
    assert_eq!(error.get_error_name(), "EntryPointNotCallable");
}

#[test]
fn test_entry_point_picks_the_overload_without_arguments() {
    let mut compilation = Compilation::from_source("fn main(x: int32) {} fn main() {}");
    let output = compilation.compile("main").unwrap();

    let entry = compilation.context.decls.get(output.entry);
    assert_eq!(entry.name, "main");
    assert!(matches!(&entry.kind, DeclKind::Function { params, .. } if params.is_empty()));
}

#[test]
fn test_custom_entry_symbol() {
    let options = CompilerOptions {
        entry_symbol: String::from("start"),
        ..CompilerOptions::default()
    };
    let loader = MemoryLoader::new().with("main", "fn start() {} fn main(x: int32) {}");
    let mut compilation = Compilation::new(options, Box::new(loader));

    let output = compilation.compile("main").unwrap();
    assert_eq!(compilation.context.decls.get(output.entry).name, "start");
}
