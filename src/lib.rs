//! Schema-typed queries over remote collections.
//!
//! A query is a serializable [`QueryOperation`] tree built against a
//! provider's schema. Two compiler passes produce and validate these trees:
//! [`lower`] turns a parsed lambda [`Expression`] into an operation plus the
//! schema of its result, and [`infer_schema`] re-derives the schema of a
//! tree supplied directly as data. Both share one type algebra, so a tree
//! accepted by lowering is always accepted by inference with the same
//! schema. [`DataSource`] is the user-facing builder over a [`Provider`];
//! [`MemoryProvider`] executes trees over in-memory JSON rows.

mod datasource;
mod error;
mod expr;
mod expr_to_op;
mod infer;
mod interpreter;
mod operation;
mod schema;
mod scope;
mod typing;

pub use datasource::{DataSource, Provider, QueryBody};
pub use error::CompileError;
pub use expr::{ExprOperator, Expression, Property};
pub use expr_to_op::lower;
pub use infer::infer_schema;
pub use interpreter::MemoryProvider;
pub use operation::{
    BinaryOperator, ElementField, LiteralValue, QueryOperation, SortStep, UnaryOperator,
};
pub use schema::{BooleanFormat, ComplexField, DateTimeFormat, SchemaNode};
pub use scope::{Scope, DATA_SOURCE_NAME};
