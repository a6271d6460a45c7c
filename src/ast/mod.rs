//! Syntax tree storage and traversal.
//!
//! - ast: the node arena, parent links and the mutation primitives
//! - nodes: the closed set of node kinds and operator enums
//! - traverse: live pre-order, cached and bottom-up walks
//! - dump: indented text rendering used by `--dump-ast`
pub mod ast;
pub mod dump;
pub mod nodes;
pub mod traverse;

#[cfg(test)]
mod tests;
