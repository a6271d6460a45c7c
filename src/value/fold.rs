//! Compile-time evaluation of intrinsic operations and casts.

use crate::{
    analyzer::intrinsics::{IntrinsicKind, IntrinsicOp},
    types::type_manager::{Primitive, TypeId},
};

use super::value::{Scalar, Value};

#[derive(Debug, Clone)]
pub enum Folded {
    Value(Value),
    /// An operand has no compile-time value.
    NotConstant,
    /// Integer division or remainder by a constant zero. Left for runtime.
    DivisionByZero,
}

/// Evaluates `op` over constant `args`, producing a value of type `result_ty`.
pub fn fold_intrinsic(op: IntrinsicOp, result_ty: TypeId, args: &[Value]) -> Folded {
    let scalars: Option<Vec<Scalar>> = args.iter().map(|arg| arg.scalar()).collect();
    let scalars = match scalars {
        Some(scalars) if scalars.len() == op.kind.arity() => scalars,
        _ => return Folded::NotConstant,
    };
    let operands: Vec<Scalar> = scalars.into_iter().map(|s| s.convert(op.operand)).collect();

    let result = match op.kind.arity() {
        1 => fold_unary(op, operands[0]),
        _ => fold_binary(op, operands[0], operands[1]),
    };

    match result {
        Ok(Some(scalar)) => Folded::Value(Value::from_scalar(result_ty, op.result_primitive(), scalar)),
        Ok(None) => Folded::NotConstant,
        Err(()) => Folded::DivisionByZero,
    }
}

fn fold_unary(op: IntrinsicOp, operand: Scalar) -> Result<Option<Scalar>, ()> {
    Ok(match (op.kind, operand) {
        (IntrinsicKind::Neg, Scalar::Int(i)) => Some(Scalar::Int(i.wrapping_neg())),
        (IntrinsicKind::Neg, Scalar::Float(x)) => Some(Scalar::Float(-x)),
        (IntrinsicKind::Not, Scalar::Bool(b)) => Some(Scalar::Bool(!b)),
        _ => None,
    })
}

fn fold_binary(op: IntrinsicOp, lhs: Scalar, rhs: Scalar) -> Result<Option<Scalar>, ()> {
    use IntrinsicKind::*;

    Ok(match (lhs, rhs) {
        (Scalar::Int(a), Scalar::Int(b)) => match op.kind {
            Add => Some(Scalar::Int(a.wrapping_add(b))),
            Sub => Some(Scalar::Int(a.wrapping_sub(b))),
            Mul => Some(Scalar::Int(a.wrapping_mul(b))),
            Div | Rem if b == 0 => return Err(()),
            Div => Some(Scalar::Int(a.wrapping_div(b))),
            Rem => Some(Scalar::Int(a.wrapping_rem(b))),
            Eq => Some(Scalar::Bool(a == b)),
            Ne => Some(Scalar::Bool(a != b)),
            Lt => Some(Scalar::Bool(a < b)),
            Le => Some(Scalar::Bool(a <= b)),
            Gt => Some(Scalar::Bool(a > b)),
            Ge => Some(Scalar::Bool(a >= b)),
            _ => None,
        },
        (Scalar::Float(a), Scalar::Float(b)) => match op.kind {
            Add => Some(Scalar::Float(a + b)),
            Sub => Some(Scalar::Float(a - b)),
            Mul => Some(Scalar::Float(a * b)),
            Div => Some(Scalar::Float(a / b)),
            Rem => Some(Scalar::Float(a % b)),
            Eq => Some(Scalar::Bool(a == b)),
            Ne => Some(Scalar::Bool(a != b)),
            Lt => Some(Scalar::Bool(a < b)),
            Le => Some(Scalar::Bool(a <= b)),
            Gt => Some(Scalar::Bool(a > b)),
            Ge => Some(Scalar::Bool(a >= b)),
            _ => None,
        },
        (Scalar::Bool(a), Scalar::Bool(b)) => match op.kind {
            And => Some(Scalar::Bool(a && b)),
            Or => Some(Scalar::Bool(a || b)),
            Eq => Some(Scalar::Bool(a == b)),
            Ne => Some(Scalar::Bool(a != b)),
            _ => None,
        },
        _ => None,
    })
}

/// Converts a constant to `to`, tagging the result with `ty`.
pub fn cast_value(value: &Value, ty: TypeId, to: Primitive) -> Option<Value> {
    let scalar = value.scalar()?;
    Some(Value::from_scalar(ty, to, scalar.convert(to)))
}
