//! Phase 1: structural normalization.
//!
//! Runs bottom-up. A block holding a single expression collapses into that
//! expression, and storage positions are marked so assignments to anything
//! else can be reported.

use crate::{
    ast::{ast::NodeId, nodes::NodeKind, traverse::walk_bottom_up},
    context::Context,
    errors::errors::{Error, ErrorImpl},
};

pub fn normalize(ctx: &mut Context, root: NodeId) {
    walk_bottom_up(ctx, root, |ctx, node| match ctx.ast.kind(node) {
        NodeKind::Block => collapse_block(ctx, node),
        NodeKind::Symbol { .. } => ctx.ast.annotation_mut(node).lvalue = true,
        NodeKind::Index | NodeKind::Field { .. } => {
            let base_is_lvalue = ctx
                .ast
                .child(node, 0)
                .map(|base| ctx.ast.annotation(base).lvalue)
                .unwrap_or(false);
            ctx.ast.annotation_mut(node).lvalue = base_is_lvalue;
        }
        NodeKind::Assign => check_lvalue(ctx, node, 0, "="),
        NodeKind::RefBind => {
            check_lvalue(ctx, node, 0, "@=");
            check_lvalue(ctx, node, 1, "@=");
        }
        NodeKind::VarDecl { is_ref: true, .. } => check_lvalue(ctx, node, 0, "@="),
        _ => {}
    });
}

/// `{ e; }` and `{ e }` become `e`.
fn collapse_block(ctx: &mut Context, block: NodeId) {
    let statement = match ctx.ast.children(block) {
        [only] => *only,
        _ => return,
    };

    let expression = match ctx.ast.kind(statement) {
        NodeKind::ExprStmt => match ctx.ast.child(statement, 0) {
            Some(expression) => expression,
            None => return,
        },
        kind if is_expression(kind) => statement,
        _ => return,
    };

    if ctx.ast.parent(block).is_none() {
        return;
    }
    ctx.ast.take_children(block);
    if expression != statement {
        ctx.ast.take_children(statement);
    }
    ctx.ast.replace_node(block, expression);
}

fn check_lvalue(ctx: &mut Context, node: NodeId, index: usize, operation: &str) {
    let target = match ctx.ast.child(node, index) {
        Some(target) => target,
        None => return,
    };
    if ctx.ast.annotation(target).lvalue {
        return;
    }

    ctx.report(Error::new(
        ErrorImpl::NotAnLvalue {
            operation: operation.to_string(),
        },
        ctx.ast.span(target).start.clone(),
    ));
}

/// Kinds that produce a value and are not statements.
pub fn is_expression(kind: &NodeKind) -> bool {
    !matches!(
        kind,
        NodeKind::Module { .. }
            | NodeKind::Block
            | NodeKind::Pair
            | NodeKind::BasicBlock
            | NodeKind::ExprStmt
            | NodeKind::While
            | NodeKind::Return
            | NodeKind::VarDecl { .. }
            | NodeKind::FuncDecl { .. }
            | NodeKind::TypeDecl { .. }
            | NodeKind::Import { .. }
    )
}
