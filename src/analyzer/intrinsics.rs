//! Builtin operators.
//!
//! Every operator is declared in the universal scope once per operand type,
//! so operator expressions go through ordinary overload resolution and are
//! then specialized to an [`IntrinsicOp`].

use std::fmt::Display;

use crate::{
    context::Context,
    scope::{decls::DeclKind, scope::ScopeId},
    types::type_manager::{Primitive, TypeId},
    Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicKind {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Neg,
    Not,
}

impl IntrinsicKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            IntrinsicKind::Add => "+",
            IntrinsicKind::Sub => "-",
            IntrinsicKind::Mul => "*",
            IntrinsicKind::Div => "/",
            IntrinsicKind::Rem => "%",
            IntrinsicKind::Eq => "==",
            IntrinsicKind::Ne => "!=",
            IntrinsicKind::Lt => "<",
            IntrinsicKind::Le => "<=",
            IntrinsicKind::Gt => ">",
            IntrinsicKind::Ge => ">=",
            IntrinsicKind::And => "&&",
            IntrinsicKind::Or => "||",
            IntrinsicKind::Neg => "-",
            IntrinsicKind::Not => "!",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            IntrinsicKind::Neg | IntrinsicKind::Not => 1,
            _ => 2,
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            IntrinsicKind::Eq
                | IntrinsicKind::Ne
                | IntrinsicKind::Lt
                | IntrinsicKind::Le
                | IntrinsicKind::Gt
                | IntrinsicKind::Ge
        )
    }
}

/// An operator specialized to one operand type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntrinsicOp {
    pub kind: IntrinsicKind,
    pub operand: Primitive,
}

impl IntrinsicOp {
    pub fn result_primitive(&self) -> Primitive {
        if self.kind.is_comparison() {
            Primitive::Bool
        } else {
            self.operand
        }
    }
}

impl Display for IntrinsicOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.operand.name(), self.kind.symbol())
    }
}

const ARITHMETIC: [IntrinsicKind; 5] = [
    IntrinsicKind::Add,
    IntrinsicKind::Sub,
    IntrinsicKind::Mul,
    IntrinsicKind::Div,
    IntrinsicKind::Rem,
];

const ORDERING: [IntrinsicKind; 6] = [
    IntrinsicKind::Eq,
    IntrinsicKind::Ne,
    IntrinsicKind::Lt,
    IntrinsicKind::Le,
    IntrinsicKind::Gt,
    IntrinsicKind::Ge,
];

/// Every operator overload the universal scope declares.
pub fn builtin_ops() -> Vec<IntrinsicOp> {
    let mut ops = vec![];

    for operand in Primitive::ARITHMETIC {
        for kind in ARITHMETIC.iter().chain(ORDERING.iter()) {
            ops.push(IntrinsicOp { kind: *kind, operand });
        }
        ops.push(IntrinsicOp {
            kind: IntrinsicKind::Neg,
            operand,
        });
    }

    for kind in [
        IntrinsicKind::Eq,
        IntrinsicKind::Ne,
        IntrinsicKind::And,
        IntrinsicKind::Or,
        IntrinsicKind::Not,
    ] {
        ops.push(IntrinsicOp {
            kind,
            operand: Primitive::Bool,
        });
    }

    ops
}

/// Declares the builtin operators in `universal`.
pub fn register_intrinsics(context: &mut Context, universal: ScopeId) {
    for op in builtin_ops() {
        let operand = op.operand.type_id();
        let arguments: Vec<TypeId> = vec![operand; op.kind.arity()];
        let arguments = context.types.make_unnamed_tuple(&arguments);
        let signature = context
            .types
            .make_func(arguments, op.result_primitive().type_id());

        let decl = context.decls.add(
            op.kind.symbol(),
            DeclKind::Intrinsic { op },
            universal,
            Position::null(),
        );
        let entry = context.decls.get_mut(decl);
        entry.ty = Some(signature);
        entry.ready = true;

        // Intrinsic groups never clash with anything else in the universal scope.
        let _ = context
            .scopes
            .add_var_def(universal, op.kind.symbol(), decl, true);
    }
}
