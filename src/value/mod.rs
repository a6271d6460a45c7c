//! Compile-time values.
//!
//! Literals and folded expressions carry a [`value::Value`]. Sequences of
//! scalars share one packed byte buffer, and element access into them
//! returns views that read and write that buffer.
pub mod fold;
pub mod value;
