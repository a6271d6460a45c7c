//! Arithmetic promotion of binary operands.
//!
//! When both operands are arithmetic but of different types, the narrower
//! one is cast to the common type before the operator is resolved. Inside a
//! basic block the cast becomes a step of its own placed just before the
//! operator, and the operand slot receives a temporary referring to it.

use crate::{
    ast::{ast::NodeId, nodes::NodeKind},
    context::Context,
    types::type_manager::{Primitive, TypeId},
    value::fold::cast_value,
};

/// Casts the operands of `node` to their promotion target. Returns how
/// many casts were inserted.
pub fn promote_operands(ctx: &mut Context, node: NodeId) -> usize {
    let (lhs, rhs) = match ctx.ast.children(node) {
        [lhs, rhs] => (*lhs, *rhs),
        _ => return 0,
    };
    let (lhs_ty, rhs_ty) = match (ctx.ast.ty(lhs), ctx.ast.ty(rhs)) {
        (Some(lhs_ty), Some(rhs_ty)) => (lhs_ty, rhs_ty),
        _ => return 0,
    };
    let target = match ctx.types.promotion_target(lhs_ty, rhs_ty) {
        Some(target) => target,
        None => return 0,
    };

    let mut inserted = 0;
    for operand in [lhs, rhs] {
        let operand_ty = ctx.ast.ty(operand).unwrap_or(TypeId::ERROR);
        if ctx.types.underlying_primitive(operand_ty) != Some(target) {
            insert_cast(ctx, node, operand, target);
            inserted += 1;
        }
    }
    inserted
}

fn insert_cast(ctx: &mut Context, user: NodeId, operand: NodeId, target: Primitive) {
    let span = ctx.ast.span(operand).clone();
    let scope = ctx.ast.scope(operand);
    let cast_ty = target.type_id();

    let placeholder = ctx.ast.add(NodeKind::NullValue, span.clone(), scope);
    ctx.ast.replace_child(user, operand, placeholder);
    let cast = ctx
        .ast
        .add_with_children(NodeKind::Cast { target: cast_ty }, span.clone(), scope, vec![operand]);
    annotate_cast(ctx, cast, operand, target);

    let block = ctx
        .ast
        .parent(user)
        .filter(|&parent| matches!(ctx.ast.kind(parent), NodeKind::BasicBlock));

    let replacement = match block {
        Some(block) => {
            let index = ctx.ast.index_in_parent(user).unwrap_or(0);
            ctx.ast.insert_child(block, index, cast);
            let temp = ctx.new_temp(cast);
            let temp = ctx.ast.add(NodeKind::Temp { temp }, span, scope);
            let annotation = ctx.ast.annotation(cast).clone();
            *ctx.ast.annotation_mut(temp) = annotation;
            temp
        }
        None => cast,
    };
    ctx.ast.replace_child(user, placeholder, replacement);
}

fn annotate_cast(ctx: &mut Context, cast: NodeId, operand: NodeId, target: Primitive) {
    let ty = target.type_id();
    let value = ctx
        .ast
        .annotation(operand)
        .value
        .as_ref()
        .and_then(|value| cast_value(value, ty, target));

    let annotation = ctx.ast.annotation_mut(cast);
    annotation.ty = Some(ty);
    annotation.value = value;
}
