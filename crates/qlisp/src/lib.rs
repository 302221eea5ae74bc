//! qlisp: a small Lisp dialect with quoted expressions
//!
//! The language has two list forms: S-expressions `(...)`, which are
//! evaluated, and Q-expressions `{...}`, which are quoted data. Atoms are
//! unsigned numbers, symbols and strings; `;` starts a line comment.
//!
//! # Pipeline
//!
//! Source text flows through a [`Blackboard`] that accumulates every
//! intermediate artifact and all located errors:
//!
//! 1. [`lexer::tokenize`] turns bytes into [`Token`]s,
//! 2. [`parser::parse`] builds the [`Node`] tree,
//! 3. [`Value::from_ast`] lifts AST nodes into runtime [`Value`]s,
//! 4. [`eval`] reduces values in an [`Environment`].
//!
//! # Quick Start
//!
//! ```
//! use qlisp::{eval, parse_source, Environment, Value};
//!
//! let blackboard = parse_source("<demo>", "{1 2 3}\n");
//! assert!(!blackboard.has_errors());
//!
//! let env = Environment::new_ref();
//! let results: Vec<Value> = blackboard
//!     .ast
//!     .children
//!     .iter()
//!     .map(|node| eval(&env, Value::from_ast(node)))
//!     .collect();
//!
//! assert_eq!(results[0].to_string(), "{1 2 3}");
//! ```
//!
//! # Errors
//!
//! Lexing and parsing report located diagnostics on the blackboard;
//! evaluation reports first-class [`Value::Error`] values that propagate
//! through S-expression evaluation by short-circuit. Nothing panics on
//! malformed input.

pub mod ast;
pub mod blackboard;
pub mod diagnostic;
pub mod env;
pub mod eval;
pub mod lexer;
pub mod location;
pub mod parser;
pub mod token;
pub mod value;

pub use ast::{AstBuilder, Node, NodeKind};
pub use blackboard::Blackboard;
pub use diagnostic::Diagnostic;
pub use env::Environment;
pub use eval::eval;
pub use location::Location;
pub use token::{Token, TokenKind};
pub use value::{BuiltinFn, EnvRef, Function, Value};

/// Lexes and parses a source text, returning the blackboard with tokens,
/// AST and any diagnostics.
pub fn parse_source(input_name: &str, source: &str) -> Blackboard {
    let mut blackboard = Blackboard::new(input_name, source);
    lexer::tokenize(&mut blackboard);
    parser::parse(&mut blackboard);
    blackboard
}
