use std::fmt::Write;

use crate::types::type_manager::TypeManager;

use super::{
    ast::{Ast, NodeId},
    nodes::NodeKind,
};

/// Renders the subtree under `root` one node per line, indented by depth.
/// Annotated nodes show their type after a colon.
pub fn dump_tree(ast: &Ast, types: &TypeManager, root: NodeId) -> String {
    let mut out = String::new();
    dump_node(ast, types, root, 0, &mut out);
    out
}

fn dump_node(ast: &Ast, types: &TypeManager, node: NodeId, depth: usize, out: &mut String) {
    let _ = write!(out, "{:indent$}{}", "", label(ast, node), indent = depth * 2);
    if let Some(ty) = ast.ty(node) {
        let _ = write!(out, " : {}", types.display(ty));
    }
    if let Some(value) = &ast.annotation(node).value {
        let _ = write!(out, " = {}", value);
    }
    out.push('\n');

    for &child in ast.children(node) {
        dump_node(ast, types, child, depth + 1, out);
    }
}

fn label(ast: &Ast, node: NodeId) -> String {
    match ast.kind(node) {
        NodeKind::Module { name } => format!("Module {}", name),
        NodeKind::Symbol { name } => format!("Symbol {}", name),
        NodeKind::Temp { temp } => format!("Temp %{}", temp.0),
        NodeKind::Binary { op } => format!("Binary {}", op.symbol()),
        NodeKind::Unary { op } => format!("Unary {}", op.symbol()),
        NodeKind::Call { name } => format!("Call {}", name),
        NodeKind::IntrinsicCall { op } => format!("IntrinsicCall {}", op),
        NodeKind::Field { name } => format!("Field .{}", name),
        NodeKind::TypeDecl { name } => format!("TypeDecl {}", name),
        NodeKind::Import { module, public } => {
            if *public {
                format!("Import {} (public)", module)
            } else {
                format!("Import {}", module)
            }
        }
        NodeKind::VarDecl { is_ref: true, .. } => String::from("VarDecl @"),
        other => other.name().to_string(),
    }
}
