//! G-Portugol Core: shared data model for the compiler/interpreter toolchain
//!
//! This crate holds the pieces every back-end (interpreter, C translator,
//! x86 generator) and the semantic analyzer need in common, so that none of
//! them has to depend on another:
//!
//! - `types`: the closed set of primitive types and the matrix type shape
//! - `ast`: the AST produced by the parser and consumed read-only by every
//!   later pass
//! - `diagnostics`: the error/tip collecting sink shared across the pipeline
//!
//! Nothing in this crate touches I/O, a specific back-end, or the parser's
//! internal representation; it is the "AST + B" (AST + symbol types) referred
//! to by the system overview.

pub mod ast;
pub mod diagnostics;
pub mod types;

pub use ast::{
    BinOp, Expr, FuncCall, FuncDecl, Literal, LValue, Param, Program, Stmt, UnaryOp, VarDecl,
};
pub use diagnostics::{Diagnostics, Severity};
pub use types::{PrimitiveType, SymbolType};
