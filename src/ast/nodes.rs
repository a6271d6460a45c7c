//! Node kinds of the syntax tree.
//!
//! Children are not stored in the kinds themselves; every node keeps an
//! ordered child list in the arena and the kind documents what each
//! position means.

use crate::{
    analyzer::intrinsics::IntrinsicOp,
    scope::decls::DeclId,
    types::type_manager::TypeId,
    Position,
};

/// Index of a temporary introduced by basic-block lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
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
}

impl BinaryOp {
    /// The name the operator's overloads are declared under.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Operators whose operands take part in arithmetic promotion.
    pub fn promotes_operands(&self) -> bool {
        !matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

/// Type syntax as written in the source, resolved against scopes during analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Name {
        name: String,
        args: Vec<TypeExpr>,
        position: Position,
    },
    List {
        element: Box<TypeExpr>,
        length: Option<u64>,
    },
    Tuple(Vec<(Option<String>, TypeExpr)>),
    Ref(Box<TypeExpr>),
    Func {
        arguments: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
    },
}

impl TypeExpr {
    pub fn named(name: &str, position: Position) -> Self {
        TypeExpr::Name {
            name: name.to_string(),
            args: vec![],
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Children: top-level items in source order.
    Module { name: String },
    /// Exactly zero or one child: a statement or a `Pair` chain.
    Block,
    /// `[first, rest]`; the value is the value of `rest`.
    Pair,
    /// Ordered steps, each producing one temporary.
    BasicBlock,
    /// `[expression]` followed by a semicolon.
    ExprStmt,
    /// Type and value are carried by the annotation.
    Literal,
    Symbol { name: String },
    Temp { temp: TempId },
    /// `[lhs, rhs]`
    Binary { op: BinaryOp },
    /// `[operand]`
    Unary { op: UnaryOp },
    /// `[target, value]`
    Assign,
    /// `[target, referent]`, written `target @= referent`.
    RefBind,
    /// Children: arguments.
    Call { name: String },
    /// Children: operands.
    IntrinsicCall { op: IntrinsicOp },
    /// `[operand]`
    Cast { target: TypeId },
    /// Children: elements; one optional name per element.
    Tuple { names: Vec<Option<String>> },
    /// Children: elements.
    List,
    /// `[base, index]`
    Index,
    /// `[base]`
    Field { name: String },
    /// `[condition, then, else?]`
    If,
    /// `[condition, body]`
    While,
    /// `[value?]`
    Return,
    /// `[initializer?]`
    VarDecl {
        decl: DeclId,
        declared: Option<TypeExpr>,
        is_ref: bool,
    },
    /// `[body]`
    FuncDecl { decl: DeclId },
    TypeDecl { name: String },
    Import { module: String, public: bool },
    /// Produces the unit value.
    NullValue,
}

impl NodeKind {
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Block | NodeKind::Pair | NodeKind::BasicBlock)
    }

    pub fn is_control_flow(&self) -> bool {
        matches!(self, NodeKind::If | NodeKind::While)
    }

    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::FuncDecl { .. } | NodeKind::TypeDecl { .. } | NodeKind::Import { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Module { .. } => "Module",
            NodeKind::Block => "Block",
            NodeKind::Pair => "Pair",
            NodeKind::BasicBlock => "BasicBlock",
            NodeKind::ExprStmt => "ExprStmt",
            NodeKind::Literal => "Literal",
            NodeKind::Symbol { .. } => "Symbol",
            NodeKind::Temp { .. } => "Temp",
            NodeKind::Binary { .. } => "Binary",
            NodeKind::Unary { .. } => "Unary",
            NodeKind::Assign => "Assign",
            NodeKind::RefBind => "RefBind",
            NodeKind::Call { .. } => "Call",
            NodeKind::IntrinsicCall { .. } => "IntrinsicCall",
            NodeKind::Cast { .. } => "Cast",
            NodeKind::Tuple { .. } => "Tuple",
            NodeKind::List => "List",
            NodeKind::Index => "Index",
            NodeKind::Field { .. } => "Field",
            NodeKind::If => "If",
            NodeKind::While => "While",
            NodeKind::Return => "Return",
            NodeKind::VarDecl { .. } => "VarDecl",
            NodeKind::FuncDecl { .. } => "FuncDecl",
            NodeKind::TypeDecl { .. } => "TypeDecl",
            NodeKind::Import { .. } => "Import",
            NodeKind::NullValue => "NullValue",
        }
    }
}
