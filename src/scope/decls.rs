use crate::{
    analyzer::intrinsics::IntrinsicOp,
    ast::{ast::NodeId, nodes::TypeExpr},
    types::type_manager::TypeId,
    value::value::Value,
    Position,
};

use super::scope::ScopeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
    pub decl: DeclId,
}

#[derive(Debug, Clone)]
pub enum DeclKind {
    Variable {
        is_const: bool,
        is_ref: bool,
    },
    Parameter,
    Function {
        params: Vec<Param>,
        ret: Option<TypeExpr>,
        /// Scope holding the parameters.
        body_scope: ScopeId,
    },
    Intrinsic {
        op: IntrinsicOp,
    },
}

#[derive(Debug, Clone)]
pub struct Decl {
    pub name: String,
    pub kind: DeclKind,
    /// Scope the declaration was added to.
    pub scope: ScopeId,
    pub node: Option<NodeId>,
    pub position: Position,
    /// Variable type, or the signature of a callable. Filled lazily for
    /// functions.
    pub ty: Option<TypeId>,
    /// Constant value of a `const` variable.
    pub value: Option<Value>,
    /// Variables become ready once their declaration has been analyzed.
    pub ready: bool,
    /// Guards signature computation against self-reference.
    pub resolving: bool,
}

impl Decl {
    pub fn is_callable_decl(&self) -> bool {
        matches!(self.kind, DeclKind::Function { .. } | DeclKind::Intrinsic { .. })
    }

    pub fn is_const(&self) -> bool {
        matches!(self.kind, DeclKind::Variable { is_const: true, .. })
    }

    pub fn intrinsic(&self) -> Option<IntrinsicOp> {
        match self.kind {
            DeclKind::Intrinsic { op } => Some(op),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct DeclTable {
    decls: Vec<Decl>,
}

impl DeclTable {
    pub fn new() -> Self {
        DeclTable { decls: vec![] }
    }

    pub fn add(&mut self, name: &str, kind: DeclKind, scope: ScopeId, position: Position) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Decl {
            name: name.to_string(),
            kind,
            scope,
            node: None,
            position,
            ty: None,
            value: None,
            ready: false,
            resolving: false,
        });
        id
    }

    pub fn get(&self, id: DeclId) -> &Decl {
        &self.decls[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}
