//! Safe expression evaluator
//!
//! Filter predicates and transform mappings are supplied by the user as
//! expression text. Instead of handing that text to a general-purpose
//! code evaluator, this module implements a small, explicitly-scoped
//! expression language:
//!
//! - field access over the current record (`price`, `customer.name`)
//! - comparisons (`==`, `!=`, `<`, `<=`, `>`, `>=`) and boolean operators
//!   (`&&`, `||`, `!`)
//! - arithmetic (`+`, `-`, `*`, `/`, `%`) and string concatenation (`+`)
//! - a fixed builtin function set (`contains`, `starts_with`, `ends_with`,
//!   `lower`, `upper`, `trim`, `len`, `num`, `str`, `round`, `abs`)
//!
//! Values are loosely typed to match the record model: numeric strings
//! coerce to numbers in arithmetic and comparisons, and a missing field
//! reads as null.

mod eval;
mod parser;
mod token;

use thiserror::Error;

pub use eval::{number_value, truthy};
pub(crate) use eval::as_number;

/// Error from parsing or evaluating an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// The expression text is malformed
    #[error("parse error at {offset}: {message}")]
    Parse { offset: usize, message: String },

    /// The expression could not be evaluated against the record
    #[error("{0}")]
    Eval(String),
}

impl ExprError {
    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn eval(message: impl Into<String>) -> Self {
        Self::Eval(message.into())
    }
}

/// A parsed expression, reusable across records
#[derive(Debug, Clone)]
pub struct Expr {
    ast: parser::Ast,
}

impl Expr {
    /// Parse expression text
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        Ok(Self {
            ast: parser::parse(source)?,
        })
    }

    /// Evaluate against a record; field names resolve to the record's
    /// values, missing fields read as null
    pub fn eval(&self, record: &serde_json::Value) -> Result<serde_json::Value, ExprError> {
        eval::eval(&self.ast, record)
    }

    /// Evaluate as a predicate
    pub fn matches(&self, record: &serde_json::Value) -> Result<bool, ExprError> {
        Ok(truthy(&self.eval(record)?))
    }
}
