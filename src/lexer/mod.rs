//! Lexical analysis module for the compiler.
//!
//! Converts source text into a stream of tokens for the parser:
//!
//! - Tokenization using an ordered table of anchored regex patterns
//! - Recognition of keywords, identifiers, literals and operators
//! - Byte-offset spans for diagnostics
//! - Comments and whitespace skipping

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
