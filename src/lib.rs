//! Schema-driven pretty printing.
//!
//! A schema is an [`Ast`] tree describing the shape of a runtime [`Value`].
//! Compiling a schema yields a [`Printer`] that renders conforming values as
//! readable, source-like text: records print as `{ a: 1 }`, tuples as
//! `[1, "x"]`, recursive schemas recurse lazily, and unions dispatch to the
//! first member whose [`Guard`] accepts the value.
//!
//! ```
//! use schema_pretty::{ast, render, Value};
//!
//! let schema = ast::type_literal(
//!     vec![ast::PropertySignature::required("a", ast::number())],
//!     vec![],
//! );
//! let value = Value::object([("a", Value::from(1))]);
//! assert_eq!(render(&schema, &value).unwrap(), "{ a: 1 }");
//! ```
//!
//! Printers are compiled by a generic [`compiler::Compiler`] driven by a
//! [`compiler::Match`] table. Custom renderings are plugged in through a
//! [`HookRegistry`], keyed by type alias name or by node kind.
pub mod ast;
pub mod cache;
pub mod compiler;
pub mod data;
pub mod error;
pub mod format;
pub mod guard;
pub mod keys;
pub mod pretty;
pub mod value;

pub use ast::{Ast, AstKind, AstRef};
pub use cache::render;
pub use compiler::{HookKey, HookRegistry};
pub use error::PrettyError;
pub use guard::{Guard, is};
pub use pretty::{Pretty, Printer, compile, compile_with};
pub use value::{PropertyKey, Symbol, Value};
