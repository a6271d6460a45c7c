//! Lowering of front-end types to LLVM types, available with the `llvm`
//! feature.
pub mod low_level;
