//! Error types for grammar loading and parser construction.
//!
//! Runtime parse diagnostics (lexical and syntax errors tied to input
//! columns) are not represented here; they accumulate as ordered strings on
//! the parse outcome so that a session can keep reporting after the first
//! problem. See [`crate::diagnostics`].

use thiserror::Error;

/// Errors that can occur while loading a grammar or building a parser.
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("empty grammar input")]
    EmptyGrammar,

    #[error("invalid production: {0}")]
    InvalidProduction(String),

    #[error("line {line} exceeds the maximum length of {max} characters")]
    LineTooLong { line: usize, max: usize },

    #[error("epsilon may only appear as a complete alternative: {0}")]
    MisplacedEpsilon(String),

    #[error("the end-of-input marker '$' cannot appear in a grammar rule: {0}")]
    ReservedEndMarker(String),

    #[error("LL(1) conflict between productions:\n  {prod1}\n  {prod2}")]
    Ll1Conflict { prod1: String, prod2: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results in this crate.
pub type Result<T> = std::result::Result<T, GrammarError>;
