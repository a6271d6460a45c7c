//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Variable, function and type declarations
//! - Expressions and operator precedence
//! - Control flow statements and block chaining
//! - Imports and exports
//! - Syntax errors

use std::rc::Rc;

use crate::{
    ast::{ast::NodeId, nodes::NodeKind},
    compilation::CompilerOptions,
    context::{Context, ModuleId},
    errors::errors::Error,
    lexer::lexer::tokenize,
    scope::decls::DeclKind,
    types::type_manager::TypeId,
};

use super::parser::parse_module;

fn parse(source: &str) -> (Context, ModuleId, Result<(), Error>) {
    let mut context = Context::new(CompilerOptions::default());
    let module = context.add_module("test", "test.lang", Rc::new(source.to_string()));
    let tokens = tokenize(source, Some("test.lang".to_string())).unwrap();
    let result = parse_module(tokens, Rc::new("test.lang".to_string()), &mut context, module);
    (context, module, result)
}

/// Renders the tree as `Kind(child, child)`, naming symbols and operators.
fn shape(context: &Context, node: NodeId) -> String {
    let label = match context.ast.kind(node) {
        NodeKind::Symbol { name } => name.clone(),
        NodeKind::Binary { op } => format!("Binary{}", op.symbol()),
        NodeKind::Unary { op } => format!("Unary{}", op.symbol()),
        NodeKind::Call { name } => format!("Call {}", name),
        other => other.name().to_string(),
    };

    let children = context.ast.children(node);
    if children.is_empty() {
        label
    } else {
        let rendered: Vec<String> = children.iter().map(|&child| shape(context, child)).collect();
        format!("{}({})", label, rendered.join(", "))
    }
}

fn parse_shape(source: &str) -> String {
    let (context, module, result) = parse(source);
    assert!(result.is_ok(), "{:?}", result);
    shape(&context, context.module(module).root)
}

#[test]
fn test_parse_variable_declaration() {
    let (context, module, result) = parse("let x = 42;");
    assert!(result.is_ok());
    assert_eq!(shape(&context, context.module(module).root), "Module(VarDecl(Literal))");

    let private = context.module(module).layers.private;
    let decls = context.scopes.get_var_defs(private, "x");
    assert_eq!(decls.len(), 1);
    assert!(matches!(
        context.decls.get(decls[0]).kind,
        DeclKind::Variable {
            is_const: false,
            is_ref: false
        }
    ));
}

#[test]
fn test_parse_const_declaration() {
    let (context, module, result) = parse("const PI: float64 = 3.14;");
    assert!(result.is_ok());

    let private = context.module(module).layers.private;
    let decl = context.scopes.get_var_defs(private, "PI")[0];
    assert!(context.decls.get(decl).is_const());
}

#[test]
fn test_parse_literal_annotations() {
    let (context, module, result) = parse("let s = \"hi\"; let f = 1.5; let b = true;");
    assert!(result.is_ok());

    let root = context.module(module).root;
    let literal_types: Vec<String> = context
        .ast
        .children(root)
        .iter()
        .map(|&decl| {
            let literal = context.ast.child(decl, 0).unwrap();
            context.types.display(context.ast.ty(literal).unwrap())
        })
        .collect();
    assert_eq!(literal_types, vec!["[int8; 2]", "float64", "bool"]);
}

#[test]
fn test_parse_function_declaration() {
    let (context, module, result) = parse("fn add(a: int32, b: int32) -> int32 { return a + b; }");
    assert!(result.is_ok());
    assert_eq!(
        shape(&context, context.module(module).root),
        "Module(FuncDecl(Block(Return(Binary+(a, b)))))"
    );

    let private = context.module(module).layers.private;
    let decl = context.scopes.get_var_defs(private, "add")[0];
    match &context.decls.get(decl).kind {
        DeclKind::Function {
            params,
            ret,
            body_scope,
        } => {
            assert_eq!(params.len(), 2);
            assert!(ret.is_some());
            assert_eq!(context.scopes.get_var_defs(*body_scope, "a"), vec![params[0].decl]);
        }
        other => panic!("expected a function, got {:?}", other),
    }
}

#[test]
fn test_parse_overloads_accumulate() {
    let (context, module, result) = parse("fn f(x: int32) {} fn f(x: float32) {}");
    assert!(result.is_ok());

    let private = context.module(module).layers.private;
    assert_eq!(context.scopes.get_var_defs(private, "f").len(), 2);
}

#[test]
fn test_parse_blocks_chain_into_pairs() {
    assert_eq!(
        parse_shape("fn main() { let a = 1; let b = 2; a + b; }"),
        "Module(FuncDecl(Block(Pair(VarDecl(Literal), Pair(VarDecl(Literal), ExprStmt(Binary+(a, b)))))))"
    );
    assert_eq!(parse_shape("fn main() {}"), "Module(FuncDecl(Block))");
}

#[test]
fn test_parse_binary_precedence() {
    assert_eq!(
        parse_shape("let x = 1 + 2 * 3;"),
        "Module(VarDecl(Binary+(Literal, Binary*(Literal, Literal))))"
    );
    assert_eq!(
        parse_shape("let x = a < b && !c || d == e;"),
        "Module(VarDecl(Binary||(Binary&&(Binary<(a, b), Unary!(c)), Binary==(d, e))))"
    );
}

#[test]
fn test_parse_if_statement() {
    assert_eq!(
        parse_shape("fn main() { if x { 1; } else { 2; } }"),
        "Module(FuncDecl(Block(If(x, Block(ExprStmt(Literal)), Block(ExprStmt(Literal))))))"
    );
    assert_eq!(
        parse_shape("fn main() { if (true) a = 1; }"),
        "Module(FuncDecl(Block(If(Literal, ExprStmt(Assign(a, Literal))))))"
    );
}

#[test]
fn test_parse_if_expression() {
    assert_eq!(
        parse_shape("let y = if c { 1 } else { 2 };"),
        "Module(VarDecl(If(c, Block(Literal), Block(Literal))))"
    );
}

#[test]
fn test_parse_while_loop() {
    assert_eq!(
        parse_shape("fn main() { while i < 10 { i = i + 1; } }"),
        "Module(FuncDecl(Block(While(Binary<(i, Literal), Block(ExprStmt(Assign(i, Binary+(i, Literal))))))))"
    );
}

#[test]
fn test_parse_aggregates() {
    assert_eq!(
        parse_shape("let t = (a: 1, b: 2); let u = t.a; let v = [1, 2][0];"),
        "Module(VarDecl(Tuple(Literal, Literal)), VarDecl(Field(t)), VarDecl(Index(List(Literal, Literal), Literal)))"
    );

    let (context, module, _) = parse("let t = (a: 1, 2);");
    let tuple = context.ast.child(context.ast.children(context.module(module).root)[0], 0).unwrap();
    match context.ast.kind(tuple) {
        NodeKind::Tuple { names } => assert_eq!(names, &vec![Some(String::from("a")), None]),
        other => panic!("expected a tuple, got {:?}", other),
    }
}

#[test]
fn test_parse_parenthesized_expression() {
    assert_eq!(parse_shape("let x = (1);"), "Module(VarDecl(Literal))");
    assert_eq!(parse_shape("let x = (1,);"), "Module(VarDecl(Tuple(Literal)))");
    assert_eq!(parse_shape("let x = ();"), "Module(VarDecl(Tuple))");
}

#[test]
fn test_parse_function_call() {
    assert_eq!(
        parse_shape("fn main() { print(1, x); }"),
        "Module(FuncDecl(Block(ExprStmt(Call print(Literal, x)))))"
    );
}

#[test]
fn test_parse_assignment_and_reference_binding() {
    assert_eq!(
        parse_shape("fn main() { x = y = 1; r @= x; }"),
        "Module(FuncDecl(Block(Pair(ExprStmt(Assign(x, Assign(y, Literal))), ExprStmt(RefBind(r, x))))))"
    );

    let (context, module, result) = parse("let r @= x;");
    assert!(result.is_ok());
    let decl = context.ast.children(context.module(module).root)[0];
    assert!(matches!(context.ast.kind(decl), NodeKind::VarDecl { is_ref: true, .. }));
}

#[test]
fn test_parse_type_declaration() {
    let (context, module, result) = parse("type Pair<T> = (T, T); let p: Pair<int32> = (1, 2);");
    assert!(result.is_ok());

    let private = context.module(module).layers.private;
    let def = context.scopes.get_type_def(private, "Pair").unwrap();
    assert_eq!(context.scopes.type_def(def).params, vec![String::from("T")]);
    assert!(context.scopes.type_def(def).resolved.is_none());
}

#[test]
fn test_parse_exports_go_to_public_layer() {
    let (context, module, result) = parse("export fn f() {} export type T = int32; fn g() {} export import util;");
    assert!(result.is_ok());

    let layers = context.module(module).layers;
    assert_eq!(context.scopes.get_var_defs(layers.public, "f").len(), 1);
    assert!(context.scopes.get_var_defs(layers.public, "g").is_empty());
    assert_eq!(context.scopes.get_var_defs(layers.private, "g").len(), 1);
    assert!(context.scopes.get_type_def(layers.public, "T").is_some());

    let import = *context.ast.children(context.module(module).root).last().unwrap();
    assert!(matches!(
        context.ast.kind(import),
        NodeKind::Import { public: true, .. }
    ));
}

#[test]
fn test_parse_nodes_record_their_scope() {
    let (context, module, result) = parse("fn main() { let a = 1; { let b = a; } }");
    assert!(result.is_ok());

    let root = context.module(module).root;
    let function = context.ast.children(root)[0];
    let body = context.ast.child(function, 0).unwrap();
    assert_ne!(context.ast.scope(body), context.module(module).layers.private);
    assert!(context.scopes.get_var_defs(context.ast.scope(body), "b").is_empty());
}

#[test]
fn test_parse_empty_program() {
    assert_eq!(parse_shape(""), "Module");
}

#[test]
fn test_parse_syntax_error_missing_semicolon() {
    let (_, _, result) = parse("let x = 42");
    assert!(result.is_err());
}

#[test]
fn test_parse_syntax_error_unexpected_token() {
    let (_, _, result) = parse("let = 5;");
    assert!(result.is_err());
}

#[test]
fn test_parse_declaration_needs_type_or_value() {
    let (_, _, result) = parse("let x;");
    assert!(result.is_err());

    let (_, _, result) = parse("const x: int32;");
    assert!(result.is_err());

    let (_, _, result) = parse("let x: int32;");
    assert!(result.is_ok());
}

#[test]
fn test_parse_redeclaration_is_an_error() {
    let (_, _, result) = parse("let x = 1; let x = 2;");
    assert_eq!(result.unwrap_err().get_error_name(), "VariableAlreadyDeclared");
}

#[test]
fn test_parse_import_only_at_top_level() {
    let (_, _, result) = parse("fn main() { import util; }");
    assert!(result.is_err());
}

#[test]
fn test_literal_types_are_primitives() {
    let (context, module, _) = parse("let x = 7;");
    let decl = context.ast.children(context.module(module).root)[0];
    let literal = context.ast.child(decl, 0).unwrap();
    assert_eq!(context.ast.ty(literal), Some(TypeId::INT64));
}
