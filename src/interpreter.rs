//! In-memory query execution over JSON rows.
//!
//! [`MemoryProvider`] holds a schema and a vector of `serde_json::Value`
//! rows and walks operation trees directly, with JavaScript-flavored value
//! semantics (loose truthiness, numeric comparison through `f64`). It backs
//! the test suites and gives small tools a provider without a remote
//! service; it is not an optimizer and evaluates trees exactly as written.

use crate::datasource::Provider;
use crate::operation::{LiteralValue, QueryOperation};
use crate::schema::SchemaNode;
use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use tracing::debug;

pub struct MemoryProvider {
    schema: SchemaNode,
    rows: Vec<Value>,
}

impl MemoryProvider {
    pub fn new(schema: SchemaNode, rows: Vec<Value>) -> MemoryProvider {
        MemoryProvider { schema, rows }
    }
}

impl Provider for MemoryProvider {
    fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    fn execute(&self, query: &QueryOperation) -> Result<Vec<Value>> {
        debug!(kind = query.kind_name(), "executing in memory");
        visit(&self.rows, query)
    }
}

/// Evaluates a collection-producing node to a vector of rows.
fn visit(root: &[Value], operation: &QueryOperation) -> Result<Vec<Value>> {
    match operation {
        QueryOperation::DataSourceReference => Ok(root.to_vec()),
        QueryOperation::Filter {
            source, predicate, ..
        } => {
            let rows = visit(root, source)?;
            let mut kept = Vec::new();
            for row in rows {
                if truthy(&evaluate(&row, predicate)?) {
                    kept.push(row);
                }
            }
            Ok(kept)
        }
        QueryOperation::Map {
            source, projection, ..
        } => {
            let rows = visit(root, source)?;
            rows.iter().map(|row| evaluate(row, projection)).collect()
        }
        QueryOperation::TakePage {
            source,
            start,
            count,
        } => {
            let rows = visit(root, source)?;
            Ok(rows
                .into_iter()
                .skip(*start as usize)
                .take(*count as usize)
                .collect())
        }
        other => bail!("cannot execute '{}' as a collection", other.kind_name()),
    }
}

/// Evaluates a scalar node against one row bound to the query parameter.
///
/// Parameter references resolve to the row by position, not by name: a
/// well-formed tree has exactly one parameter in scope at each level.
fn evaluate(row: &Value, operation: &QueryOperation) -> Result<Value> {
    if let Some((op, left, right)) = operation.as_binary() {
        use crate::operation::BinaryOperator::*;
        let l = evaluate(row, left)?;
        let r = evaluate(row, right)?;
        return Ok(match op {
            Equal => Value::Bool(loose_eq(&l, &r)),
            NotEqual => Value::Bool(!loose_eq(&l, &r)),
            Greater => Value::Bool(number_of(&l)? > number_of(&r)?),
            GreaterOrEqual => Value::Bool(number_of(&l)? >= number_of(&r)?),
            Less => Value::Bool(number_of(&l)? < number_of(&r)?),
            LessOrEqual => Value::Bool(number_of(&l)? <= number_of(&r)?),
            And => Value::Bool(truthy(&l) && truthy(&r)),
            Or => Value::Bool(truthy(&l) || truthy(&r)),
            Add => json!(number_of(&l)? + number_of(&r)?),
            Subtract => json!(number_of(&l)? - number_of(&r)?),
            Multiply => json!(number_of(&l)? * number_of(&r)?),
            Divide => json!(number_of(&l)? / number_of(&r)?),
        });
    }
    match operation {
        QueryOperation::Parameter { .. } => Ok(row.clone()),
        QueryOperation::Literal { value } => Ok(match value {
            LiteralValue::Bool(b) => Value::Bool(*b),
            LiteralValue::Number(n) => json!(n),
            LiteralValue::Text(t) => Value::String(t.clone()),
        }),
        QueryOperation::FieldReference {
            element,
            field_name,
        } => {
            let element = evaluate(row, element)?;
            element
                .get(field_name)
                .cloned()
                .with_context(|| format!("row has no field '{field_name}'"))
        }
        QueryOperation::ElementLiteral { fields } => {
            let mut object = serde_json::Map::with_capacity(fields.len());
            for field in fields {
                object.insert(field.name.clone(), evaluate(row, &field.value)?);
            }
            Ok(Value::Object(object))
        }
        QueryOperation::CollectionLiteral { elements } => Ok(Value::Array(
            elements
                .iter()
                .map(|element| evaluate(row, element))
                .collect::<Result<_>>()?,
        )),
        QueryOperation::Not { operand } => Ok(Value::Bool(!truthy(&evaluate(row, operand)?))),
        QueryOperation::Negate { operand } => Ok(json!(-number_of(&evaluate(row, operand)?)?)),
        QueryOperation::Filter { .. } | QueryOperation::Map { .. } => {
            // Nested query over a relationship field materialized on the row.
            let rows = evaluate_nested(row, operation)?;
            Ok(Value::Array(rows))
        }
        other => bail!("cannot evaluate '{}'", other.kind_name()),
    }
}

/// Evaluates a Filter/Map whose source is itself a scalar expression
/// yielding an array (a relationship field on the current row).
fn evaluate_nested(row: &Value, operation: &QueryOperation) -> Result<Vec<Value>> {
    match operation {
        QueryOperation::Filter {
            source, predicate, ..
        } => {
            let rows = evaluate_nested(row, source)?;
            let mut kept = Vec::new();
            for inner in rows {
                if truthy(&evaluate(&inner, predicate)?) {
                    kept.push(inner);
                }
            }
            Ok(kept)
        }
        QueryOperation::Map {
            source, projection, ..
        } => {
            let rows = evaluate_nested(row, source)?;
            rows.iter()
                .map(|inner| evaluate(inner, projection))
                .collect()
        }
        other => match evaluate(row, other)? {
            Value::Array(rows) => Ok(rows),
            value => bail!(
                "'{}' produced {value} where a collection was expected",
                other.kind_name()
            ),
        },
    }
}

/// Equality that does not distinguish integer from float representations.
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

fn number_of(value: &Value) -> Result<f64> {
    value
        .as_f64()
        .with_context(|| format!("expected a number, got {value}"))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{BinaryOperator, ElementField};
    use crate::schema::{ComplexField, SchemaNode};

    fn provider() -> MemoryProvider {
        MemoryProvider::new(
            SchemaNode::Complex {
                fields: vec![
                    ComplexField {
                        name: "name".to_string(),
                        title: "Name".to_string(),
                        schema: SchemaNode::text(Some(40)),
                        is_nullable: false,
                    },
                    ComplexField {
                        name: "stock".to_string(),
                        title: "Stock".to_string(),
                        schema: SchemaNode::integer(),
                        is_nullable: false,
                    },
                ],
                key: vec!["name".to_string()],
            },
            vec![
                json!({"name": "Chai", "stock": 39}),
                json!({"name": "Chang", "stock": 17}),
                json!({"name": "Aniseed Syrup", "stock": 0}),
            ],
        )
    }

    #[test]
    fn test_filter_keeps_matching_rows() {
        let query = QueryOperation::Filter {
            source: Box::new(QueryOperation::DataSourceReference),
            parameter_name: "p".to_string(),
            predicate: Box::new(BinaryOperator::Equal.build(
                QueryOperation::parameter("p").field("stock"),
                QueryOperation::literal(0),
            )),
        };
        let rows = provider().execute(&query).unwrap();
        assert_eq!(rows, vec![json!({"name": "Aniseed Syrup", "stock": 0})]);
    }

    #[test]
    fn test_map_projects_rows() {
        let query = QueryOperation::Map {
            source: Box::new(QueryOperation::DataSourceReference),
            parameter_name: "p".to_string(),
            projection: Box::new(QueryOperation::ElementLiteral {
                fields: vec![ElementField {
                    name: "double".to_string(),
                    value: BinaryOperator::Multiply.build(
                        QueryOperation::parameter("p").field("stock"),
                        QueryOperation::literal(2),
                    ),
                }],
            }),
        };
        let rows = provider().execute(&query).unwrap();
        assert_eq!(rows[0], json!({"double": 78.0}));
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_ordering_comparisons_and_paging() {
        let query = QueryOperation::TakePage {
            source: Box::new(QueryOperation::Filter {
                source: Box::new(QueryOperation::DataSourceReference),
                parameter_name: "p".to_string(),
                predicate: Box::new(BinaryOperator::Greater.build(
                    QueryOperation::parameter("p").field("stock"),
                    QueryOperation::literal(10),
                )),
            }),
            start: 1,
            count: 5,
        };
        let rows = provider().execute(&query).unwrap();
        assert_eq!(rows, vec![json!({"name": "Chang", "stock": 17})]);
    }

    #[test]
    fn test_missing_field_is_an_execution_error() {
        let query = QueryOperation::Map {
            source: Box::new(QueryOperation::DataSourceReference),
            parameter_name: "p".to_string(),
            projection: Box::new(QueryOperation::parameter("p").field("missing")),
        };
        assert!(provider().execute(&query).is_err());
    }

    #[test]
    fn test_unsupported_root_node_fails() {
        let query = QueryOperation::Count {
            source: Box::new(QueryOperation::DataSourceReference),
        };
        assert!(provider().execute(&query).is_err());
    }

    #[test]
    fn test_truthiness_is_loose() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(truthy(&json!("x")));
        assert!(truthy(&json!([])));
        assert!(truthy(&json!({})));
    }
}
