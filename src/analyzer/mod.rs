//! Semantic analysis.
//!
//! - analyzer: module loading and phase ordering
//! - normalize: block collapsing and lvalue checks
//! - lowering: flattening into basic blocks of temporaries
//! - infer: typing, overload resolution and constant folding
//! - promotion: implicit arithmetic casts
//! - overload, signature, type_resolve: lookups shared by the phases
//! - intrinsics: the builtin operators
//! - entry: entry-point resolution
pub mod analyzer;
pub mod entry;
pub mod infer;
pub mod intrinsics;
pub mod lowering;
pub mod normalize;
pub mod overload;
pub mod promotion;
pub mod signature;
pub mod type_resolve;

#[cfg(test)]
mod tests;
