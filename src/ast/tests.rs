//! Unit tests for the node arena and its walks.

use crate::{scope::scope::ScopeId, Span};

use super::{
    ast::{Ast, NodeId},
    nodes::{BinaryOp, NodeKind},
    traverse::{collect_preorder, walk_bottom_up, walk_cached, walk_preorder},
};

fn symbol(ast: &mut Ast, name: &str) -> NodeId {
    ast.add(
        NodeKind::Symbol {
            name: name.to_string(),
        },
        Span::null(),
        ScopeId(0),
    )
}

fn binary(ast: &mut Ast, lhs: NodeId, rhs: NodeId) -> NodeId {
    ast.add_with_children(
        NodeKind::Binary { op: BinaryOp::Add },
        Span::null(),
        ScopeId(0),
        vec![lhs, rhs],
    )
}

fn name_of(ast: &Ast, node: NodeId) -> String {
    match ast.kind(node) {
        NodeKind::Symbol { name } => name.clone(),
        other => other.name().to_string(),
    }
}

#[test]
fn test_children_know_their_parent() {
    let mut ast = Ast::new();
    let a = symbol(&mut ast, "a");
    let b = symbol(&mut ast, "b");
    let sum = binary(&mut ast, a, b);

    assert_eq!(ast.parent(a), Some(sum));
    assert_eq!(ast.parent(b), Some(sum));
    assert_eq!(ast.children(sum), &[a, b]);
    assert_eq!(ast.parent(sum), None);
    assert!(ast.check_links(sum).is_ok());
}

#[test]
fn test_replace_child_keeps_links_consistent() {
    let mut ast = Ast::new();
    let a = symbol(&mut ast, "a");
    let b = symbol(&mut ast, "b");
    let sum = binary(&mut ast, a, b);
    let c = symbol(&mut ast, "c");

    ast.replace_child(sum, a, c);

    assert_eq!(ast.children(sum), &[c, b]);
    assert_eq!(ast.parent(c), Some(sum));
    assert_eq!(ast.parent(a), None);
    assert!(ast.check_links(sum).is_ok());
}

#[test]
#[should_panic(expected = "is not a child")]
fn test_replace_child_of_stranger_panics() {
    let mut ast = Ast::new();
    let a = symbol(&mut ast, "a");
    let b = symbol(&mut ast, "b");
    let sum = binary(&mut ast, a, b);
    let stranger = symbol(&mut ast, "x");
    let replacement = symbol(&mut ast, "y");

    ast.replace_child(sum, stranger, replacement);
}

#[test]
#[should_panic(expected = "already attached")]
fn test_attaching_twice_panics() {
    let mut ast = Ast::new();
    let a = symbol(&mut ast, "a");
    let b = symbol(&mut ast, "b");
    let _sum = binary(&mut ast, a, b);
    let other = symbol(&mut ast, "c");

    let _second = binary(&mut ast, a, other);
}

#[test]
fn test_detach_and_reattach_in_place() {
    let mut ast = Ast::new();
    let a = symbol(&mut ast, "a");
    let b = symbol(&mut ast, "b");
    let sum = binary(&mut ast, a, b);

    let slot = ast.detach_self(a);
    assert_eq!(ast.children(sum), &[b]);
    assert_eq!(ast.parent(a), None);

    let cast = ast.add_with_children(NodeKind::List, Span::null(), ScopeId(0), vec![a]);
    ast.replace_detached_child(slot, cast);

    assert_eq!(ast.children(sum), &[cast, b]);
    assert_eq!(ast.parent(a), Some(cast));
    assert!(ast.check_links(sum).is_ok());
}

#[test]
#[should_panic(expected = "has no parent")]
fn test_detach_root_panics() {
    let mut ast = Ast::new();
    let root = symbol(&mut ast, "root");
    ast.detach_self(root);
}

#[test]
fn test_take_children_detaches_all() {
    let mut ast = Ast::new();
    let a = symbol(&mut ast, "a");
    let b = symbol(&mut ast, "b");
    let sum = binary(&mut ast, a, b);

    let taken = ast.take_children(sum);

    assert_eq!(taken, vec![a, b]);
    assert!(ast.children(sum).is_empty());
    assert_eq!(ast.parent(a), None);
    assert_eq!(ast.parent(b), None);
}

#[test]
fn test_bottom_up_visits_children_first() {
    let mut ast = Ast::new();
    let a = symbol(&mut ast, "a");
    let b = symbol(&mut ast, "b");
    let inner = binary(&mut ast, a, b);
    let c = symbol(&mut ast, "c");
    let outer = binary(&mut ast, inner, c);

    let mut order = vec![];
    walk_bottom_up(&mut ast, outer, |ast, node| order.push(name_of(ast, node)));

    assert_eq!(order, vec!["a", "b", "Binary", "c", "Binary"]);
}

#[test]
fn test_bottom_up_tolerates_replacing_visited_node() {
    let mut ast = Ast::new();
    let a = symbol(&mut ast, "a");
    let b = symbol(&mut ast, "b");
    let sum = binary(&mut ast, a, b);

    walk_bottom_up(&mut ast, sum, |ast, node| {
        if name_of(ast, node) == "a" {
            let renamed = symbol(ast, "renamed");
            ast.replace_node(node, renamed);
        }
    });

    let names: Vec<String> = ast.children(sum).iter().map(|&n| name_of(&ast, n)).collect();
    assert_eq!(names, vec!["renamed", "b"]);
    assert!(ast.check_links(sum).is_ok());
}

#[test]
fn test_preorder_descends_into_rewritten_children() {
    let mut ast = Ast::new();
    let a = symbol(&mut ast, "a");
    let b = symbol(&mut ast, "b");
    let sum = binary(&mut ast, a, b);

    let mut seen = vec![];
    walk_preorder(&mut ast, sum, |ast, node| {
        seen.push(name_of(ast, node));
        if node == sum {
            let old = ast.children(sum)[1];
            let fresh = symbol(ast, "fresh");
            ast.replace_child(sum, old, fresh);
        }
    });

    assert_eq!(seen, vec!["Binary", "a", "fresh"]);
}

#[test]
fn test_cached_walk_uses_snapshot() {
    let mut ast = Ast::new();
    let a = symbol(&mut ast, "a");
    let b = symbol(&mut ast, "b");
    let sum = binary(&mut ast, a, b);

    let is_symbol = |ast: &Ast, node: NodeId| matches!(ast.kind(node), NodeKind::Symbol { .. });
    assert_eq!(collect_preorder(&ast, sum, is_symbol), vec![a, b]);

    let mut visited = 0;
    walk_cached(&mut ast, sum, is_symbol, |ast, node| {
        visited += 1;
        let replacement = symbol(ast, "z");
        ast.replace_node(node, replacement);
    });

    // Replacements are not revisited.
    assert_eq!(visited, 2);
    let names: Vec<String> = ast.children(sum).iter().map(|&n| name_of(&ast, n)).collect();
    assert_eq!(names, vec!["z", "z"]);
}
