use crate::{
    analyzer::overload::Binding,
    scope::scope::ScopeId,
    types::type_manager::TypeId,
    value::value::Value,
    Span,
};

use super::nodes::NodeKind;

/// Handle of a node inside an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Facts attached to a node by semantic analysis.
#[derive(Debug, Clone, Default)]
pub struct Annotation {
    pub ty: Option<TypeId>,
    /// Compile-time value, when the node folds to a constant.
    pub value: Option<Value>,
    /// Whether the node denotes assignable storage.
    pub lvalue: bool,
    /// Declaration or intrinsic the node resolved to.
    pub binding: Option<Binding>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    /// Lexical scope the node was parsed in. Survives the removal of
    /// enclosing blocks.
    pub scope: ScopeId,
    pub annotation: Annotation,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Where a node sat before [`Ast::detach_self`] removed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetachedSlot {
    pub parent: NodeId,
    pub index: usize,
}

/// Arena owning every node of every module.
///
/// Each node has at most one parent and the parent's child list contains
/// it exactly once. All mutation goes through the methods below, which keep
/// both directions of the link in sync.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Ast { nodes: vec![] }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add(&mut self, kind: NodeKind, span: Span, scope: ScopeId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            scope,
            annotation: Annotation::default(),
            parent: None,
            children: vec![],
        });
        id
    }

    /// Adds a node and attaches `children` to it in order.
    pub fn add_with_children(
        &mut self,
        kind: NodeKind,
        span: Span,
        scope: ScopeId,
        children: Vec<NodeId>,
    ) -> NodeId {
        let id = self.add(kind, span, scope);
        for child in children {
            self.push_child(id, child);
        }
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.get(id).kind
    }

    pub fn span(&self, id: NodeId) -> &Span {
        &self.get(id).span
    }

    pub fn scope(&self, id: NodeId) -> ScopeId {
        self.get(id).scope
    }

    pub fn annotation(&self, id: NodeId) -> &Annotation {
        &self.get(id).annotation
    }

    pub fn annotation_mut(&mut self, id: NodeId) -> &mut Annotation {
        &mut self.get_mut(id).annotation
    }

    pub fn ty(&self, id: NodeId) -> Option<TypeId> {
        self.get(id).annotation.ty
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.get(id).children.get(index).copied()
    }

    /// Calls `f` on a snapshot of the node's children, in order.
    pub fn each_child(&self, id: NodeId, mut f: impl FnMut(NodeId)) {
        for &child in &self.get(id).children {
            f(child);
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// Appends a detached node as the last child of `parent`.
    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.assert_detached(child);
        self.get_mut(child).parent = Some(parent);
        self.get_mut(parent).children.push(child);
    }

    /// Inserts a detached node at `index` in the child list of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.assert_detached(child);
        self.get_mut(child).parent = Some(parent);
        self.get_mut(parent).children.insert(index, child);
    }

    /// Puts the detached node `new` where `old` was. `old` becomes detached.
    ///
    /// Panics if `old` is not a child of `parent`.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        let index = match self.children(parent).iter().position(|&child| child == old) {
            Some(index) => index,
            None => panic!(
                "replace_child: node {:?} is not a child of {:?}",
                old, parent
            ),
        };
        self.assert_detached(new);

        self.get_mut(parent).children[index] = new;
        self.get_mut(new).parent = Some(parent);
        self.get_mut(old).parent = None;
    }

    /// Replaces `old` by `new` wherever `old` is attached. Roots stay roots.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) {
        if let Some(parent) = self.parent(old) {
            self.replace_child(parent, old, new);
        }
    }

    /// Removes the node from its parent's child list.
    ///
    /// Panics if the node has no parent.
    pub fn detach_self(&mut self, id: NodeId) -> DetachedSlot {
        let parent = match self.parent(id) {
            Some(parent) => parent,
            None => panic!("detach_self: node {:?} has no parent", id),
        };
        let index = self
            .children(parent)
            .iter()
            .position(|&child| child == id)
            .unwrap_or_else(|| panic!("detach_self: {:?} missing from its parent", id));

        self.get_mut(parent).children.remove(index);
        self.get_mut(id).parent = None;
        DetachedSlot { parent, index }
    }

    /// Attaches `node` in the slot a previous [`Ast::detach_self`] vacated.
    pub fn replace_detached_child(&mut self, slot: DetachedSlot, node: NodeId) {
        self.insert_child(slot.parent, slot.index, node);
    }

    /// Detaches every child of `id` and returns them in order.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.get_mut(id).children);
        for &child in &children {
            self.get_mut(child).parent = None;
        }
        children
    }

    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.get_mut(id).kind = kind;
    }

    /// Verifies parent and child links below `root`. Returns the first
    /// offending node.
    pub fn check_links(&self, root: NodeId) -> Result<(), NodeId> {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            for &child in self.children(node) {
                if self.parent(child) != Some(node) {
                    return Err(child);
                }
                let occurrences = self.children(node).iter().filter(|&&c| c == child).count();
                if occurrences != 1 {
                    return Err(child);
                }
                stack.push(child);
            }
        }
        Ok(())
    }

    fn assert_detached(&self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            panic!("node {:?} is already attached to {:?}", id, parent);
        }
    }
}
