//! Name resolution.
//!
//! - scope: layered scopes, overload groups, type definitions and
//!   cycle-safe lookup through imports
//! - decls: the declaration table shared by every scope
pub mod decls;
pub mod scope;
