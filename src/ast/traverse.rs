//! Tree walks over the arena.
//!
//! The walks take any state that can hand out its [`Ast`], so a pass can
//! mutate both the tree and its own bookkeeping from the visitor.

use super::ast::{Ast, NodeId};

pub trait TreeAccess {
    fn tree(&self) -> &Ast;
}

impl TreeAccess for Ast {
    fn tree(&self) -> &Ast {
        self
    }
}

/// Pre-order walk that reads each node's children after visiting it.
///
/// The visitor may rewrite anything below the node it is visiting; the walk
/// descends into whatever children the node has once the visitor returns.
pub fn walk_preorder<S, F>(state: &mut S, root: NodeId, mut visit: F)
where
    S: TreeAccess,
    F: FnMut(&mut S, NodeId),
{
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        visit(state, node);
        for &child in state.tree().children(node).iter().rev() {
            stack.push(child);
        }
    }
}

/// Pre-order list of the nodes below `root` (inclusive) matching `select`.
pub fn collect_preorder(ast: &Ast, root: NodeId, select: impl Fn(&Ast, NodeId) -> bool) -> Vec<NodeId> {
    let mut found = vec![];
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if select(ast, node) {
            found.push(node);
        }
        for &child in ast.children(node).iter().rev() {
            stack.push(child);
        }
    }
    found
}

/// Collects the matching nodes first, then runs `action` on each of them.
///
/// Safe for actions that restructure the tree arbitrarily.
pub fn walk_cached<S, P, F>(state: &mut S, root: NodeId, select: P, mut action: F)
where
    S: TreeAccess,
    P: Fn(&Ast, NodeId) -> bool,
    F: FnMut(&mut S, NodeId),
{
    let nodes = collect_preorder(state.tree(), root, select);
    for node in nodes {
        action(state, node);
    }
}

/// Post-order walk: every child is visited before its parent.
///
/// Children are snapshotted before descending, so the visitor may replace
/// the node it is given in its parent.
pub fn walk_bottom_up<S, F>(state: &mut S, root: NodeId, mut visit: F)
where
    S: TreeAccess,
    F: FnMut(&mut S, NodeId),
{
    bottom_up_inner(state, root, &mut visit);
}

fn bottom_up_inner<S, F>(state: &mut S, node: NodeId, visit: &mut F)
where
    S: TreeAccess,
    F: FnMut(&mut S, NodeId),
{
    let children = state.tree().children(node).to_vec();
    for child in children {
        bottom_up_inner(state, child, visit);
    }
    visit(state, node);
}
