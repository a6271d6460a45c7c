//! Fuzzy type comparison used by overload resolution.
//!
//! `compare(from, to)` prices converting a value of type `from` into type
//! `to`. Zero is an exact match; `Cost::Invalid` means no implicit
//! conversion exists.

use std::{fmt::Display, ops::Add};

use super::type_manager::{Primitive, TypeId, TypeKind, TypeManager};

pub const DENAME_COST: u32 = 1;
pub const PARAM_COST: u32 = 2;
pub const UNSIZE_LIST_COST: u32 = 1;
pub const INT_TO_FLOAT_COST: u32 = 10;
pub const WIDEN_STEP_COST: u32 = 1;
pub const NARROW_STEP_COST: u32 = 2;

/// Ordered so that every valid cost sorts before `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cost {
    Valid(u32),
    Invalid,
}

impl Cost {
    pub const ZERO: Cost = Cost::Valid(0);

    pub fn is_valid(&self) -> bool {
        matches!(self, Cost::Valid(_))
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, other: Cost) -> Cost {
        match (self, other) {
            (Cost::Valid(a), Cost::Valid(b)) => Cost::Valid(a.saturating_add(b)),
            _ => Cost::Invalid,
        }
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cost::Valid(cost) => write!(f, "{}", cost),
            Cost::Invalid => write!(f, "invalid"),
        }
    }
}

impl TypeManager {
    pub fn compare(&self, from: TypeId, to: TypeId) -> Cost {
        if from == to {
            return Cost::ZERO;
        }

        let from_kind = self.kind(from);
        let to_kind = self.kind(to);

        match (from_kind, to_kind) {
            (TypeKind::Error, _) | (_, TypeKind::Error) => Cost::ZERO,

            // Both sides lose their names for free. Two distinct nominal
            // types with the same expansion therefore compare equal.
            (TypeKind::Named { expanded: a, .. }, TypeKind::Named { expanded: b, .. }) => {
                self.compare(*a, *b)
            }
            (TypeKind::Named { expanded, .. }, _) => {
                self.compare(*expanded, to) + Cost::Valid(DENAME_COST)
            }
            (_, TypeKind::Named { expanded, .. }) => {
                self.compare(from, *expanded) + Cost::Valid(DENAME_COST)
            }

            (TypeKind::Param { .. }, _) | (_, TypeKind::Param { .. }) => Cost::Valid(PARAM_COST),

            (TypeKind::Tuple { fields }, other) if fields.len() == 1 && !is_tuple(other) => {
                self.compare(fields[0].ty, to)
            }
            (other, TypeKind::Tuple { fields }) if fields.len() == 1 && !is_tuple(other) => {
                self.compare(from, fields[0].ty)
            }

            (TypeKind::Primitive(a), TypeKind::Primitive(b)) => primitive_cost(*a, *b),

            (
                TypeKind::List { element: from_element, length: from_length },
                TypeKind::List { element: to_element, length: to_length },
            ) => {
                let length_cost = match (from_length, to_length) {
                    (a, b) if a == b => Cost::ZERO,
                    (Some(_), None) => Cost::Valid(UNSIZE_LIST_COST),
                    _ => Cost::Invalid,
                };
                length_cost + self.compare(*from_element, *to_element)
            }

            (TypeKind::Tuple { fields: from_fields }, TypeKind::Tuple { fields: to_fields }) => {
                if from_fields.len() != to_fields.len() {
                    return Cost::Invalid;
                }
                let mut total = Cost::ZERO;
                for (a, b) in from_fields.iter().zip(to_fields.iter()) {
                    if let (Some(a_name), Some(b_name)) = (&a.name, &b.name) {
                        if a_name != b_name {
                            return Cost::Invalid;
                        }
                    }
                    total = total + self.compare(a.ty, b.ty);
                    if !total.is_valid() {
                        return Cost::Invalid;
                    }
                }
                total
            }

            (TypeKind::Reference { target: a }, TypeKind::Reference { target: b }) => {
                if self.compare(*a, *b) == Cost::ZERO {
                    Cost::ZERO
                } else {
                    Cost::Invalid
                }
            }

            (
                TypeKind::Func { arguments: from_args, ret: from_ret },
                TypeKind::Func { arguments: to_args, ret: to_ret },
            ) => self.compare(*from_args, *to_args) + self.compare(*from_ret, *to_ret),

            _ => Cost::Invalid,
        }
    }

    /// The common arithmetic type two operands widen to, when they differ.
    pub fn promotion_target(&self, lhs: TypeId, rhs: TypeId) -> Option<Primitive> {
        let a = self.underlying_primitive(lhs)?;
        let b = self.underlying_primitive(rhs)?;
        promote(a, b)
    }
}

fn is_tuple(kind: &TypeKind) -> bool {
    matches!(kind, TypeKind::Tuple { .. })
}

fn step_cost(from_rank: u32, to_rank: u32) -> Cost {
    if to_rank >= from_rank {
        Cost::Valid((to_rank - from_rank) * WIDEN_STEP_COST)
    } else {
        Cost::Valid((from_rank - to_rank) * NARROW_STEP_COST)
    }
}

pub fn primitive_cost(from: Primitive, to: Primitive) -> Cost {
    if from == to {
        return Cost::ZERO;
    }

    if from.is_integer() && to.is_integer() {
        step_cost(from.rank(), to.rank())
    } else if from.is_float() && to.is_float() {
        step_cost(from.rank(), to.rank())
    } else if from.is_integer() && to.is_float() {
        Cost::Valid(INT_TO_FLOAT_COST + to.rank() * WIDEN_STEP_COST)
    } else {
        Cost::Invalid
    }
}

/// Floats win over integers, and within a family the wider type wins.
/// Returns `None` when no cast is needed or the pair is not arithmetic.
pub fn promote(a: Primitive, b: Primitive) -> Option<Primitive> {
    if a == b || !a.is_arithmetic() || !b.is_arithmetic() {
        return None;
    }

    let order = |p: Primitive| (p.is_float(), p.rank());
    Some(if order(a) >= order(b) { a } else { b })
}
