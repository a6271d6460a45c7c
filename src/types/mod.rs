//! Canonical type representation.
//!
//! Types are hash-consed by the [`type_manager::TypeManager`], so identity
//! of handles is structural equality. Generic definitions are instantiated
//! by temporarily substituting their parameters and re-uniquing the clone.
pub mod compare;
pub mod display;
pub mod type_manager;

#[cfg(test)]
mod tests;
