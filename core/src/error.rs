//! Error types shared by the library.
//!
//! Query syntax problems are returned to the caller as [`QueryError`]. Oracle
//! failures never abort an index build; the normalizer counts them instead.

use std::io;

use thiserror::Error;

use crate::query::BoolOp;

/// A malformed boolean query. No partial result accompanies these errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unbalanced parentheses: ')' at token {position} has no matching '('")]
    UnexpectedClose { position: usize },

    #[error("unbalanced parentheses: {open} '(' left unclosed")]
    UnclosedGroup { open: usize },

    #[error("{op} has no left operand")]
    MissingLeftOperand { op: BoolOp },

    #[error("{op} has no right operand")]
    MissingRightOperand { op: BoolOp },

    #[error("{op} found where an operand was expected")]
    OperatorInOperandPosition { op: BoolOp },

    #[error("NOT is not followed by an operand")]
    DanglingNot,

    #[error("two operands without an operator between them")]
    MissingOperator,
}

/// Failure reported by a [`LinguisticOracle`](crate::oracle::LinguisticOracle).
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("oracle rejected token {token:?}: {reason}")]
    Rejected { token: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid term pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("confidence threshold {0} is outside [0, 1]")]
    Threshold(f32),

    #[error("unsupported stemmer language {0:?}")]
    Language(String),

    #[error("dictionary line {line}: {reason}")]
    Dictionary { line: usize, reason: String },
}
