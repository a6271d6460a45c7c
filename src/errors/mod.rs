//! Error types and error handling for the compiler.
//!
//! This module defines the diagnostics produced throughout compilation:
//!
//! - Error structures with source position, severity and note positions
//! - Specific error variants for lexing, parsing and semantic analysis
//! - Fatal errors, which abort compilation through `Result`
//! - A collector that counts the hard errors gating later stages

pub mod errors;

#[cfg(test)]
mod tests;
