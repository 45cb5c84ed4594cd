//! Defines the compile-time error taxonomy shared by the lowering and inference passes.
//!
//! Every variant is a logic error in the query being built: it is surfaced
//! synchronously to the caller, never retried, and never produces a partial
//! schema. Provider execution errors (network, backend) are a separate concern
//! and are reported as `anyhow::Error` by the provider, not here.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("name '{0}' is not bound in the current scope")]
    UnboundName(String),

    #[error("no field named '{field}' on the target schema")]
    UnknownField { field: String },

    #[error("cannot access field '{field}' on a {target} schema")]
    InvalidFieldAccess { field: String, target: &'static str },

    #[error("operator '{operator}' is not defined for {detail}")]
    SchemaMismatch { operator: &'static str, detail: String },

    #[error("collection elements have differing schemas: {expected}, then {got}")]
    HeterogeneousCollection { expected: String, got: String },

    #[error("filter predicate must type as boolean, got {got}")]
    PredicateNotBoolean { got: String },

    #[error("expected a collection-like schema, got {got}")]
    NotACollection { got: &'static str },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation '{operation}' has no schema rule")]
    Unsupported { operation: String },
}
