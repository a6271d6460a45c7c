//! Phase 2: lowering expressions into basic blocks of temporaries.
//!
//! Every statement is flattened into an ordered list of steps. Each
//! sub-expression becomes its own step and is referred to from its parent
//! through a `Temp` node. Control flow, nested containers and declarations
//! split the steps into separate basic blocks chained by pairs, so after
//! this phase no `Block` remains and every step's operands are temporaries.

use crate::{
    ast::{ast::NodeId, nodes::NodeKind},
    context::Context,
    Span,
};

use super::normalize::is_expression;

/// Lowers every top-level item of the module rooted at `root`.
pub fn lower_module(ctx: &mut Context, root: NodeId) {
    let items = ctx.ast.take_children(root);
    for item in items {
        let lowered = lower_statement(ctx, item);
        ctx.ast.push_child(root, lowered);
    }
}

/// Lowers a detached statement and returns its detached replacement.
pub fn lower_statement(ctx: &mut Context, node: NodeId) -> NodeId {
    match ctx.ast.kind(node) {
        NodeKind::Pair => {
            let parts = ctx.ast.take_children(node);
            for part in parts {
                let lowered = lower_statement(ctx, part);
                ctx.ast.push_child(node, lowered);
            }
            node
        }
        NodeKind::Block => {
            let mut children = ctx.ast.take_children(node);
            match children.pop() {
                Some(only) => lower_statement(ctx, only),
                None => empty_basic_block(ctx, node),
            }
        }
        NodeKind::FuncDecl { .. } => {
            if let Some(body) = ctx.ast.take_children(node).pop() {
                let lowered = lower_statement(ctx, body);
                ctx.ast.push_child(node, lowered);
            }
            node
        }
        NodeKind::TypeDecl { .. } | NodeKind::Import { .. } | NodeKind::BasicBlock => node,
        _ => {
            let mut steps = vec![];
            flatten_statement(ctx, node, &mut steps);
            split_steps(ctx, node, steps)
        }
    }
}

/// Appends the steps of a statement. Values of expressions are discarded.
fn flatten_statement(ctx: &mut Context, node: NodeId, steps: &mut Vec<NodeId>) {
    match ctx.ast.kind(node) {
        NodeKind::ExprStmt => {
            if let Some(expression) = ctx.ast.take_children(node).pop() {
                flatten_value(ctx, expression, steps);
            }
        }
        NodeKind::Block | NodeKind::Pair => {
            for statement in ctx.ast.take_children(node) {
                flatten_statement(ctx, statement, steps);
            }
        }
        NodeKind::VarDecl { .. } | NodeKind::Return => {
            flatten_operands(ctx, node, steps);
            steps.push(node);
        }
        NodeKind::If => {
            lower_if(ctx, node);
            steps.push(node);
        }
        NodeKind::While => {
            lower_while(ctx, node);
            steps.push(node);
        }
        NodeKind::FuncDecl { .. } | NodeKind::TypeDecl { .. } | NodeKind::Import { .. } => {
            let lowered = lower_statement(ctx, node);
            steps.push(lowered);
        }
        _ => {
            flatten_value(ctx, node, steps);
        }
    }
}

/// Appends the steps computing `node` and returns a detached `Temp`
/// referring to its value.
fn flatten_value(ctx: &mut Context, node: NodeId, steps: &mut Vec<NodeId>) -> NodeId {
    match ctx.ast.kind(node) {
        NodeKind::Temp { .. } => node,
        NodeKind::Block | NodeKind::Pair => {
            let statements = ctx.ast.take_children(node);
            flatten_sequence(ctx, node, statements, steps)
        }
        NodeKind::ExprStmt => match ctx.ast.take_children(node).pop() {
            Some(expression) => flatten_value(ctx, expression, steps),
            None => null_step(ctx, node, steps),
        },
        NodeKind::If => {
            lower_if(ctx, node);
            steps.push(node);
            temp_for(ctx, node)
        }
        NodeKind::While => {
            lower_while(ctx, node);
            steps.push(node);
            temp_for(ctx, node)
        }
        kind if !is_expression(kind) => {
            flatten_statement(ctx, node, steps);
            null_step(ctx, node, steps)
        }
        _ => {
            flatten_operands(ctx, node, steps);
            steps.push(node);
            temp_for(ctx, node)
        }
    }
}

/// A block used as a value: leading statements become steps and the last
/// statement provides the value, or a null value when it produces none.
fn flatten_sequence(ctx: &mut Context, origin: NodeId, statements: Vec<NodeId>, steps: &mut Vec<NodeId>) -> NodeId {
    let mut statements = statements;
    let last = match statements.pop() {
        Some(last) => last,
        None => return null_step(ctx, origin, steps),
    };
    for statement in statements {
        flatten_statement(ctx, statement, steps);
    }

    match ctx.ast.kind(last) {
        NodeKind::Pair | NodeKind::Block => {
            let rest = ctx.ast.take_children(last);
            flatten_sequence(ctx, last, rest, steps)
        }
        _ => flatten_value(ctx, last, steps),
    }
}

/// Replaces every operand of `node` by a temporary computed in `steps`.
fn flatten_operands(ctx: &mut Context, node: NodeId, steps: &mut Vec<NodeId>) {
    let operands = ctx.ast.take_children(node);
    for operand in operands {
        let temp = flatten_value(ctx, operand, steps);
        ctx.ast.push_child(node, temp);
    }
}

fn lower_if(ctx: &mut Context, node: NodeId) {
    let mut parts = ctx.ast.take_children(node).into_iter();
    if let Some(condition) = parts.next() {
        let condition = lower_condition(ctx, condition);
        ctx.ast.push_child(node, condition);
    }
    for arm in parts {
        let lowered = lower_statement(ctx, arm);
        ctx.ast.push_child(node, lowered);
    }
}

fn lower_while(ctx: &mut Context, node: NodeId) {
    let mut parts = ctx.ast.take_children(node).into_iter();
    if let Some(condition) = parts.next() {
        let condition = lower_condition(ctx, condition);
        ctx.ast.push_child(node, condition);
    }
    for body in parts {
        let lowered = lower_statement(ctx, body);
        ctx.ast.push_child(node, lowered);
    }
}

/// A condition becomes its own container whose last step is the value, so
/// a loop re-evaluates all of it.
fn lower_condition(ctx: &mut Context, condition: NodeId) -> NodeId {
    let mut steps = vec![];
    flatten_value(ctx, condition, &mut steps);
    split_steps(ctx, condition, steps)
}

fn temp_for(ctx: &mut Context, producer: NodeId) -> NodeId {
    let temp = ctx.new_temp(producer);
    let span = ctx.ast.span(producer).clone();
    let scope = ctx.ast.scope(producer);
    ctx.ast.add(NodeKind::Temp { temp }, span, scope)
}

fn null_step(ctx: &mut Context, origin: NodeId, steps: &mut Vec<NodeId>) -> NodeId {
    let span = ctx.ast.span(origin).clone();
    let scope = ctx.ast.scope(origin);
    let null = ctx.ast.add(NodeKind::NullValue, span, scope);
    steps.push(null);
    temp_for(ctx, null)
}

fn empty_basic_block(ctx: &mut Context, origin: NodeId) -> NodeId {
    let span = ctx.ast.span(origin).clone();
    let scope = ctx.ast.scope(origin);
    ctx.ast.add(NodeKind::BasicBlock, span, scope)
}

/// Steps that cannot live inside a basic block.
fn splits_block(kind: &NodeKind) -> bool {
    kind.is_control_flow() || kind.is_container() || kind.is_declaration()
}

/// Packs `steps` into basic blocks. Every control-flow node, container or
/// declaration among them splits the run it sits in, and the pieces are
/// chained into pairs in order.
fn split_steps(ctx: &mut Context, origin: NodeId, steps: Vec<NodeId>) -> NodeId {
    let mut segments: Vec<NodeId> = vec![];
    let mut run: Vec<NodeId> = vec![];

    for step in steps {
        if splits_block(ctx.ast.kind(step)) {
            if !run.is_empty() {
                segments.push(basic_block(ctx, std::mem::take(&mut run)));
            }
            segments.push(step);
        } else {
            run.push(step);
        }
    }
    if !run.is_empty() {
        segments.push(basic_block(ctx, run));
    }

    let mut segments = segments.into_iter().rev();
    let mut rest = match segments.next() {
        Some(last) => last,
        None => return empty_basic_block(ctx, origin),
    };
    for first in segments {
        let span = ctx.ast.span(first).to(ctx.ast.span(rest));
        let scope = ctx.ast.scope(first);
        rest = ctx
            .ast
            .add_with_children(NodeKind::Pair, span, scope, vec![first, rest]);
    }
    rest
}

fn basic_block(ctx: &mut Context, steps: Vec<NodeId>) -> NodeId {
    let span = match (steps.first(), steps.last()) {
        (Some(&first), Some(&last)) => ctx.ast.span(first).to(ctx.ast.span(last)),
        _ => Span::null(),
    };
    let scope = steps
        .first()
        .map(|&first| ctx.ast.scope(first))
        .unwrap_or(ctx.universal);
    ctx.ast
        .add_with_children(NodeKind::BasicBlock, span, scope, steps)
}

/// Checks the shape lowering guarantees below `root`: no blocks or
/// expression statements remain, and every basic-block step takes only
/// temporaries as operands. Returns the first offending node.
pub fn verify_lowered(ctx: &Context, root: NodeId) -> Result<(), NodeId> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match ctx.ast.kind(node) {
            NodeKind::Block | NodeKind::ExprStmt => return Err(node),
            NodeKind::BasicBlock => {
                for &step in ctx.ast.children(node) {
                    if splits_block(ctx.ast.kind(step)) {
                        return Err(step);
                    }
                    let operands_are_temps = ctx
                        .ast
                        .children(step)
                        .iter()
                        .all(|&operand| matches!(ctx.ast.kind(operand), NodeKind::Temp { .. }));
                    if !operands_are_temps {
                        return Err(step);
                    }
                }
            }
            _ => stack.extend(ctx.ast.children(node).iter().copied()),
        }
    }
    Ok(())
}
