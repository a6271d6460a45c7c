//! Integration tests for end-to-end analysis.
//!
//! These tests drive source text through loading, tokenization, parsing,
//! all three analysis phases and entry-point resolution.

use std::{fs, path::PathBuf};

use frontend::{
    analyzer::{intrinsics::IntrinsicKind, overload::Binding},
    ast::{ast::NodeId, nodes::NodeKind, traverse::collect_preorder},
    compilation::{Compilation, CompilerOptions},
    context::ModuleId,
    display_error,
    loader::{FileLoader, MemoryLoader},
    scope::decls::DeclId,
    types::type_manager::TypeId,
};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("frontend_tests").join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn error_names(compilation: &Compilation) -> Vec<String> {
    compilation
        .diagnostics()
        .iter()
        .map(|error| error.get_error_name().to_string())
        .collect()
}

fn module_named(compilation: &Compilation, name: &str) -> ModuleId {
    compilation.context.find_module(name).unwrap()
}

fn nodes_in(compilation: &Compilation, module: ModuleId, select: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
    let root = compilation.context.module(module).root;
    collect_preorder(&compilation.context.ast, root, |ast, node| select(ast.kind(node)))
}

fn exported(compilation: &Compilation, module: ModuleId, name: &str) -> DeclId {
    let public = compilation.context.module(module).layers.public;
    compilation.context.scopes.get_var_defs(public, name)[0]
}

fn declared_type(compilation: &Compilation, module: ModuleId, name: &str) -> Option<TypeId> {
    nodes_in(compilation, module, |kind| matches!(kind, NodeKind::VarDecl { .. }))
        .into_iter()
        .find_map(|node| match compilation.context.ast.kind(node) {
            NodeKind::VarDecl { decl, .. } if compilation.context.decls.get(*decl).name == name => {
                compilation.context.decls.get(*decl).ty
            }
            _ => None,
        })
}

/// Binding of the single call to `name` in `module`.
fn call_binding(compilation: &Compilation, module: ModuleId, name: &str) -> Option<Binding> {
    let calls = nodes_in(compilation, module, |kind| {
        matches!(kind, NodeKind::Call { name: callee } if callee == name)
    });
    assert_eq!(calls.len(), 1);
    compilation.context.ast.annotation(calls[0]).binding
}

fn multiplications(compilation: &Compilation, module: ModuleId) -> usize {
    nodes_in(compilation, module, |kind| {
        matches!(kind, NodeKind::IntrinsicCall { op } if op.kind == IntrinsicKind::Mul)
    })
    .len()
}

#[test]
fn test_compile_multi_module_program() {
    let loader = MemoryLoader::new()
        .with(
            "main",
            "import geometry;

             fn main() {
                 let p: Point<int32> = (x: 1, y: 2);
                 let d = distance2(p);
                 while d > 0 { d = d - 1; }
             }",
        )
        .with(
            "geometry",
            "export type Point<T> = (x: T, y: T);

             export fn distance2(p: Point<int32>) -> int64 {
                 let x = p.x;
                 let y = p.y;
                 return x * x + y * y;
             }",
        );
    let mut compilation = Compilation::new(CompilerOptions::default(), Box::new(loader));

    let output = compilation.compile("main").unwrap();
    assert!(!compilation.diagnostics().has_errors(), "{:?}", error_names(&compilation));
    assert_eq!(compilation.context.decls.get(output.entry).name, "main");
    assert_eq!(compilation.context.modules.len(), 2);

    let geometry = module_named(&compilation, "geometry");
    let distance2 = exported(&compilation, geometry, "distance2");
    assert_eq!(call_binding(&compilation, output.root, "distance2"), Some(Binding::Decl(distance2)));
    assert_eq!(declared_type(&compilation, output.root, "d"), Some(TypeId::INT64));
    assert_eq!(multiplications(&compilation, geometry), 2);
    assert!(nodes_in(&compilation, geometry, |kind| matches!(kind, NodeKind::Binary { .. })).is_empty());
}

#[test]
fn test_compile_from_disk() {
    let dir = scratch_dir("from_disk");
    fs::write(dir.join("app.lang"), "import math; fn main() { let y = square(3); }").unwrap();
    fs::write(dir.join("math.lang"), "export fn square(x: int64) -> int64 { return x * x; }").unwrap();

    let mut compilation = Compilation::new(CompilerOptions::default(), Box::new(FileLoader::new(dir)));
    let output = compilation.compile("app").unwrap();
    assert!(!compilation.diagnostics().has_errors(), "{:?}", error_names(&compilation));

    let math = module_named(&compilation, "math");
    let square = exported(&compilation, math, "square");
    assert_eq!(call_binding(&compilation, output.root, "square"), Some(Binding::Decl(square)));
    assert_eq!(declared_type(&compilation, output.root, "y"), Some(TypeId::INT64));
    assert!(compilation.dump(math).contains("IntrinsicCall int64.*"));
}

#[test]
fn test_missing_file_is_fatal() {
    let dir = scratch_dir("missing_file");
    fs::write(dir.join("app.lang"), "import absent; fn main() {}").unwrap();

    let mut compilation = Compilation::new(CompilerOptions::default(), Box::new(FileLoader::new(dir)));
    let error = compilation.compile("app").unwrap_err();
    assert!(error.is_fatal());
    assert_eq!(error.get_error_name(), "ModuleNotFound");
}

#[test]
fn test_syntax_error_is_fatal() {
    let mut compilation = Compilation::from_source("fn main() { let x = ; }");
    let error = compilation.compile("main").unwrap_err();
    assert!(error.is_fatal());
}

#[test]
fn test_errors_accumulate_across_functions() {
    let mut compilation = Compilation::from_source(
        "fn a() { undefined(); }
         fn b() -> bool { return 1; }
         fn c() { 1 = 2; }
         fn main() {}",
    );

    compilation.compile("main").unwrap();
    assert_eq!(
        error_names(&compilation),
        vec!["NotAnLvalue", "VariableNotDeclared", "TypeMatchError"]
    );
    assert_eq!(compilation.diagnostics().error_count(), 3);
}

#[test]
fn test_diagnostic_rendering_points_at_source() {
    let source = "fn main() {\n    1 = 2;\n}\n";
    let mut compilation = Compilation::from_source(source);
    compilation.compile("main").unwrap();

    let error = compilation.diagnostics().find("NotAnLvalue").unwrap();
    let rendered = display_error(error, source);
    assert!(rendered.starts_with("Error: NotAnLvalue"));
    assert!(rendered.contains("-> main.lang"));
    assert!(rendered.contains("2 | 1 = 2;"));
}

#[test]
fn test_dump_shows_specialized_operators() {
    let mut compilation = Compilation::from_source("const k = 40 + 2; fn main() {}");
    let output = compilation.compile("main").unwrap();

    let dump = compilation.dump(output.root);
    assert!(dump.contains("IntrinsicCall int64.+ : int64 = 42"), "{}", dump);
    assert!(!dump.contains("Binary"));
}
