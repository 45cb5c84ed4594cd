//! The user-facing query builder.
//!
//! A [`DataSource`] wraps a provider handle, the current operation tree, and
//! the cached schema of the rows that tree will produce (always a
//! `Collection`). `filter` and `map` return a brand-new `DataSource` rather
//! than mutating the receiver, so chained calls form an immutable chain of
//! queries, each independently reusable. The only member that performs I/O is
//! [`DataSource::to_array`]; everything else is pure tree construction.

use crate::error::CompileError;
use crate::expr::Expression;
use crate::expr_to_op;
use crate::infer;
use crate::operation::QueryOperation;
use crate::schema::SchemaNode;
use crate::scope::Scope;
use crate::typing;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// An execution backend for query operation trees.
///
/// The core contract is request/response: one outstanding call per
/// `execute` invocation, no cancellation semantics at this layer. Execution
/// errors (network, backend) are the provider's concern and are reported as
/// `anyhow::Error`, never as [`CompileError`].
pub trait Provider {
    /// The root entity's shape (a `Complex` schema).
    fn schema(&self) -> &SchemaNode;

    /// Executes `query` and returns the resulting rows.
    fn execute(&self, query: &QueryOperation) -> anyhow::Result<Vec<Value>>;
}

/// The body of a `filter` or `map` call: either a native lambda expression
/// to be lowered, or a pre-built `(parameter name, operation tree)` pair to
/// be re-validated. Both normalize to the same downstream path.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryBody {
    Expression(Expression),
    Operation {
        parameter_name: String,
        operation: QueryOperation,
    },
}

impl From<Expression> for QueryBody {
    fn from(expr: Expression) -> Self {
        QueryBody::Expression(expr)
    }
}

impl QueryBody {
    /// A pre-built operation tree whose free parameter is `parameter_name`.
    pub fn operation(parameter_name: impl Into<String>, operation: QueryOperation) -> QueryBody {
        QueryBody::Operation {
            parameter_name: parameter_name.into(),
            operation,
        }
    }
}

/// A typed handle on a remote collection plus the query built against it.
#[derive(Clone)]
pub struct DataSource {
    provider: Arc<dyn Provider>,
    query: QueryOperation,
    result_schema: SchemaNode,
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("query", &self.query)
            .field("result_schema", &self.result_schema)
            .finish_non_exhaustive()
    }
}

impl DataSource {
    /// Wraps `query` against `provider`, inferring the result schema. Fails
    /// if the query does not produce a collection, or does not validate.
    pub fn new(provider: Arc<dyn Provider>, query: QueryOperation) -> Result<Self, CompileError> {
        let scope = Scope::with_data_source(SchemaNode::collection(provider.schema().clone()));
        let result_schema = infer::infer_schema(&scope, &query)?;
        if !result_schema.is_collection() {
            return Err(CompileError::NotACollection {
                got: result_schema.kind_name(),
            });
        }
        debug!(schema = %result_schema, "data source constructed");
        Ok(DataSource {
            provider,
            query,
            result_schema,
        })
    }

    /// A data source over the provider's root collection.
    pub fn root(provider: Arc<dyn Provider>) -> Result<Self, CompileError> {
        DataSource::new(provider, QueryOperation::DataSourceReference)
    }

    pub fn query(&self) -> &QueryOperation {
        &self.query
    }

    /// The shape of the rows this query produces; always a `Collection`.
    pub fn result_schema(&self) -> &SchemaNode {
        &self.result_schema
    }

    /// Narrows rows by a predicate; the result shape is unchanged.
    pub fn filter(&self, body: impl Into<QueryBody>) -> Result<Self, CompileError> {
        let (parameter_name, predicate, predicate_schema) = self.lower_body(body.into())?;
        if !predicate_schema.is_boolean() {
            return Err(CompileError::PredicateNotBoolean {
                got: predicate_schema.to_string(),
            });
        }
        debug!(parameter = %parameter_name, "filter appended");
        Ok(DataSource {
            provider: Arc::clone(&self.provider),
            query: QueryOperation::Filter {
                source: Box::new(self.query.clone()),
                parameter_name,
                predicate: Box::new(predicate),
            },
            result_schema: self.result_schema.clone(),
        })
    }

    /// Projects each row; the result is a collection of the projected shape.
    pub fn map(&self, body: impl Into<QueryBody>) -> Result<Self, CompileError> {
        let (parameter_name, projection, projection_schema) = self.lower_body(body.into())?;
        debug!(parameter = %parameter_name, schema = %projection_schema, "map appended");
        Ok(DataSource {
            provider: Arc::clone(&self.provider),
            query: QueryOperation::Map {
                source: Box::new(self.query.clone()),
                parameter_name,
                projection: Box::new(projection),
            },
            result_schema: SchemaNode::collection(projection_schema),
        })
    }

    /// Executes the query against the provider. The only member that
    /// performs I/O.
    pub fn to_array(&self) -> anyhow::Result<Vec<Value>> {
        debug!("executing query");
        self.provider.execute(&self.query)
    }

    /// Normalizes a body to `(parameter name, operation, schema)` with the
    /// parameter bound to the current element schema.
    fn lower_body(
        &self,
        body: QueryBody,
    ) -> Result<(String, QueryOperation, SchemaNode), CompileError> {
        let element_schema = typing::element_schema_of(&self.result_schema)?.clone();
        match body {
            QueryBody::Expression(Expression::Lambda {
                mut parameters,
                body,
            }) if parameters.len() == 1 => {
                let parameter_name = parameters.remove(0);
                let scope = Scope::new().extended(&parameter_name, element_schema);
                let (operation, schema) = expr_to_op::lower(&scope, &body)?;
                Ok((parameter_name, operation, schema))
            }
            QueryBody::Expression(_) => Err(CompileError::InvalidArgument(
                "body must be a lambda expression with exactly one parameter".to_string(),
            )),
            QueryBody::Operation {
                parameter_name,
                operation,
            } => {
                let scope = Scope::new().extended(&parameter_name, element_schema);
                let schema = infer::infer_schema(&scope, &operation)?;
                Ok((parameter_name, operation, schema))
            }
        }
    }
}
